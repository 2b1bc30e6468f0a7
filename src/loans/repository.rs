use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::domain::{ApplicationId, LoanApplication};

/// Storage abstraction so the service module can be exercised in isolation.
/// Concurrency guarantees are owned entirely by the implementation.
pub trait LoanApplicationStore: Send + Sync {
    fn list(&self) -> Result<Vec<LoanApplication>, RepositoryError>;
    fn fetch(&self, id: ApplicationId) -> Result<Option<LoanApplication>, RepositoryError>;
    /// Insert a new record, assigning its identifier. The `id` on the
    /// incoming record is ignored.
    fn insert(&self, record: LoanApplication) -> Result<LoanApplication, RepositoryError>;
    fn update(&self, record: LoanApplication) -> Result<(), RepositoryError>;
    fn delete(&self, id: ApplicationId) -> Result<(), RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// In-memory store backing the service. Identifiers are assigned from a
/// monotonic sequence starting at 1.
#[derive(Debug, Default)]
pub struct MemoryLoanStore {
    records: Mutex<BTreeMap<ApplicationId, LoanApplication>>,
    sequence: AtomicU64,
}

impl MemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> ApplicationId {
        ApplicationId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl LoanApplicationStore for MemoryLoanStore {
    fn list(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn insert(&self, mut record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        let id = self.next_id();
        record.id = id;
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.insert(id, record.clone());
        Ok(record)
    }

    fn update(&self, record: LoanApplication) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.id, record);
        Ok(())
    }

    fn delete(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}
