use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::loans::clients::{AdminCatalog, ClientError, UserDirectory};
use crate::loans::domain::{
    ApplicationId, Borrower, LoanApplication, LoanProduct, NewLoanApplication, Vendor,
};
use crate::loans::repository::{LoanApplicationStore, MemoryLoanStore, RepositoryError};
use crate::loans::service::LoanApplicationService;

pub(super) fn borrower(id: u64) -> Borrower {
    Borrower {
        user_id: id,
        name: Some("Asha Iyer".to_string()),
        email: Some("asha@example.com".to_string()),
    }
}

pub(super) fn product(id: u64) -> LoanProduct {
    LoanProduct {
        product_id: id,
        product_name: Some("Home Loan".to_string()),
        interest_rate: Some(8.4),
        max_amount: Some(5_000_000),
    }
}

pub(super) fn vendor(id: u64) -> Vendor {
    Vendor {
        vendor_id: id,
        vendor_name: Some("Acme Lending Partners".to_string()),
    }
}

pub(super) fn submission() -> NewLoanApplication {
    NewLoanApplication {
        amount_required: 250_000,
        tenure: 36,
        review_message: "first home purchase".to_string(),
        user_id: 1,
        product_id: 2,
        vendor_id: 3,
    }
}

/// User directory fake that records every lookup so tests can assert when
/// remote validation does (or does not) happen.
#[derive(Default)]
pub(super) struct StaticUserDirectory {
    users: HashMap<u64, Borrower>,
    calls: Mutex<Vec<u64>>,
}

impl StaticUserDirectory {
    pub(super) fn with_users(users: impl IntoIterator<Item = Borrower>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.user_id, u)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<u64> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn user_by_id(&self, id: u64) -> Result<Option<Borrower>, ClientError> {
        self.calls.lock().expect("calls mutex poisoned").push(id);
        Ok(self.users.get(&id).cloned())
    }
}

/// Admin catalog fake with the same call-recording behavior.
#[derive(Default)]
pub(super) struct StaticAdminCatalog {
    products: HashMap<u64, LoanProduct>,
    vendors: HashMap<u64, Vendor>,
    calls: Mutex<Vec<String>>,
}

impl StaticAdminCatalog {
    pub(super) fn with_entries(
        products: impl IntoIterator<Item = LoanProduct>,
        vendors: impl IntoIterator<Item = Vendor>,
    ) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.product_id, p)).collect(),
            vendors: vendors.into_iter().map(|v| (v.vendor_id, v)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl AdminCatalog for StaticAdminCatalog {
    async fn product_by_id(&self, id: u64) -> Result<Option<LoanProduct>, ClientError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(format!("product/{id}"));
        Ok(self.products.get(&id).cloned())
    }

    async fn vendor_by_id(&self, id: u64) -> Result<Option<Vendor>, ClientError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(format!("vendor/{id}"));
        Ok(self.vendors.get(&id).cloned())
    }

    async fn products_by_name(&self, name: &str) -> Result<Vec<LoanProduct>, ClientError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(format!("byName/{name}"));
        Ok(self
            .products
            .values()
            .filter(|p| p.product_name.as_deref() == Some(name))
            .cloned()
            .collect())
    }
}

/// Catalog whose every call fails at the transport level.
pub(super) struct UnreachableCatalog;

#[async_trait]
impl AdminCatalog for UnreachableCatalog {
    async fn product_by_id(&self, _id: u64) -> Result<Option<LoanProduct>, ClientError> {
        Err(ClientError::Unreachable("admin service offline".to_string()))
    }

    async fn vendor_by_id(&self, _id: u64) -> Result<Option<Vendor>, ClientError> {
        Err(ClientError::Unreachable("admin service offline".to_string()))
    }

    async fn products_by_name(&self, _name: &str) -> Result<Vec<LoanProduct>, ClientError> {
        Err(ClientError::Unreachable("admin service offline".to_string()))
    }
}

/// Store whose every call fails, for surfacing repository errors.
pub(super) struct UnavailableStore;

impl LoanApplicationStore for UnavailableStore {
    fn list(&self) -> Result<Vec<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: ApplicationId) -> Result<Option<LoanApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _record: LoanApplication) -> Result<LoanApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: LoanApplication) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: ApplicationId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type TestService =
    LoanApplicationService<MemoryLoanStore, StaticUserDirectory, StaticAdminCatalog>;

/// Service wired with the in-memory store and fakes that know the entities
/// referenced by [`submission`].
pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryLoanStore>,
    Arc<StaticUserDirectory>,
    Arc<StaticAdminCatalog>,
) {
    let store = Arc::new(MemoryLoanStore::new());
    let users = Arc::new(StaticUserDirectory::with_users([borrower(1)]));
    let catalog = Arc::new(StaticAdminCatalog::with_entries(
        [product(2)],
        [vendor(3)],
    ));
    let service = LoanApplicationService::new(store.clone(), users.clone(), catalog.clone());
    (service, store, users, catalog)
}
