use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::clients::{AdminCatalog, ClientError, UserDirectory};
use super::domain::{
    ApplicationId, ApplicationStatus, Borrower, FieldPatch, LoanApplication,
    LoanApplicationUpdate, LoanProduct, NewLoanApplication, PatchSet, Vendor,
};
use super::repository::{LoanApplicationStore, RepositoryError};

/// Which remote entity a resolution failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Borrower,
    Product,
    Vendor,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Borrower => "user",
            EntityKind::Product => "loan product",
            EntityKind::Vendor => "vendor",
        };
        f.write_str(label)
    }
}

/// Error raised by the orchestrator.
///
/// `MissingReference` (the remote service answered and the entity does not
/// exist) is deliberately distinct from `Upstream` (the remote service could
/// not be reached or returned garbage); callers map them to different
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("loan application not found for id {0}")]
    NotFound(ApplicationId),
    #[error("{entity} not found with id {id}")]
    MissingReference { entity: EntityKind, id: u64 },
    #[error("{entity} service failure: {source}")]
    Upstream {
        entity: EntityKind,
        #[source]
        source: ClientError,
    },
    #[error(transparent)]
    InvalidStatus(#[from] super::domain::InvalidStatus),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Orchestrator over the loan application store and the two remote services.
/// Stateless per request; every dependency is injected so tests can
/// substitute fakes.
pub struct LoanApplicationService<S, U, C> {
    store: Arc<S>,
    users: Arc<U>,
    catalog: Arc<C>,
}

impl<S, U, C> LoanApplicationService<S, U, C>
where
    S: LoanApplicationStore + 'static,
    U: UserDirectory + 'static,
    C: AdminCatalog + 'static,
{
    pub fn new(store: Arc<S>, users: Arc<U>, catalog: Arc<C>) -> Self {
        Self {
            store,
            users,
            catalog,
        }
    }

    /// Every stored application, unfiltered and unpaginated.
    pub fn list(&self) -> Result<Vec<LoanApplication>, ServiceError> {
        Ok(self.store.list()?)
    }

    pub fn get(&self, id: ApplicationId) -> Result<LoanApplication, ServiceError> {
        self.store.fetch(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// Create a new application. All three references must resolve remotely
    /// before anything is written; a single miss aborts with nothing
    /// persisted.
    pub async fn create(
        &self,
        submission: NewLoanApplication,
    ) -> Result<LoanApplication, ServiceError> {
        let (user, product, vendor) = self
            .resolve_references(
                submission.user_id,
                submission.product_id,
                submission.vendor_id,
            )
            .await?;

        let record = LoanApplication {
            id: ApplicationId(0),
            amount_required: submission.amount_required,
            tenure: submission.tenure,
            status: ApplicationStatus::Submitted,
            review_message: submission.review_message,
            user,
            product,
            vendor,
        };

        let stored = self.store.insert(record)?;
        info!(id = %stored.id, "loan application created");
        Ok(stored)
    }

    /// Overwrite amount, tenure, review message, and status, then re-resolve
    /// and re-validate all three references exactly as create does.
    pub async fn update(
        &self,
        id: ApplicationId,
        update: LoanApplicationUpdate,
    ) -> Result<LoanApplication, ServiceError> {
        let mut record = self.get(id)?;

        let (user, product, vendor) = self
            .resolve_references(update.user_id, update.product_id, update.vendor_id)
            .await?;

        record.amount_required = update.amount_required;
        record.tenure = update.tenure;
        record.review_message = update.review_message;
        record.status = update.status;
        record.user = user;
        record.product = product;
        record.vendor = vendor;

        self.store.update(record.clone())?;
        info!(id = %id, "loan application updated");
        Ok(record)
    }

    pub fn delete(&self, id: ApplicationId) -> Result<(), ServiceError> {
        // Load first so an absent id surfaces as NotFound, not a store error.
        let record = self.get(id)?;
        self.store.delete(record.id)?;
        info!(id = %id, "loan application deleted");
        Ok(())
    }

    /// Parse `status` against the lifecycle enumeration and persist it. The
    /// stored record is untouched when parsing fails.
    pub fn update_status(
        &self,
        id: ApplicationId,
        status: &str,
    ) -> Result<LoanApplication, ServiceError> {
        let mut record = self.get(id)?;
        let parsed = ApplicationStatus::from_str(status)?;
        record.status = parsed;
        self.store.update(record.clone())?;
        info!(id = %id, status = parsed.label(), "loan application status changed");
        Ok(record)
    }

    /// Apply a set of field patches. Reference patches attach a bare
    /// placeholder carrying only the id; no remote validation happens here,
    /// unlike create and full update.
    pub fn apply_patch(
        &self,
        id: ApplicationId,
        patch: PatchSet,
    ) -> Result<LoanApplication, ServiceError> {
        let mut record = self.get(id)?;

        for change in patch.iter() {
            match change {
                FieldPatch::AmountRequired(amount) => record.amount_required = *amount,
                FieldPatch::Tenure(tenure) => record.tenure = *tenure,
                FieldPatch::ReviewMessage(message) => record.review_message = message.clone(),
                FieldPatch::Status(status) => record.status = *status,
                FieldPatch::User(user_id) => record.user = Borrower::bare(*user_id),
                FieldPatch::Product(product_id) => {
                    record.product = LoanProduct::bare(*product_id)
                }
                FieldPatch::Vendor(vendor_id) => {
                    record.vendor = Vendor::bare(*vendor_id)
                }
            }
        }

        self.store.update(record.clone())?;
        debug!(id = %id, fields = patch.len(), "loan application patched");
        Ok(record)
    }

    /// Remote product lookup by name. Zero matches is an empty list, not an
    /// error.
    pub async fn products_by_name(&self, name: &str) -> Result<Vec<LoanProduct>, ServiceError> {
        self.catalog
            .products_by_name(name)
            .await
            .map_err(|source| ServiceError::Upstream {
                entity: EntityKind::Product,
                source,
            })
    }

    /// Sequentially resolve the three references. An empty remote result is a
    /// `MissingReference`; a transport failure is `Upstream`. Nothing has
    /// been written by the time this returns, so all-or-nothing persistence
    /// holds trivially.
    async fn resolve_references(
        &self,
        user_id: u64,
        product_id: u64,
        vendor_id: u64,
    ) -> Result<(Borrower, LoanProduct, Vendor), ServiceError> {
        let user = self
            .users
            .user_by_id(user_id)
            .await
            .map_err(|source| upstream(EntityKind::Borrower, source))?
            .ok_or_else(|| missing(EntityKind::Borrower, user_id))?;

        let product = self
            .catalog
            .product_by_id(product_id)
            .await
            .map_err(|source| upstream(EntityKind::Product, source))?
            .ok_or_else(|| missing(EntityKind::Product, product_id))?;

        let vendor = self
            .catalog
            .vendor_by_id(vendor_id)
            .await
            .map_err(|source| upstream(EntityKind::Vendor, source))?
            .ok_or_else(|| missing(EntityKind::Vendor, vendor_id))?;

        Ok((user, product, vendor))
    }
}

fn missing(entity: EntityKind, id: u64) -> ServiceError {
    warn!(%entity, id, "referenced entity absent in remote service");
    ServiceError::MissingReference { entity, id }
}

fn upstream(entity: EntityKind, source: ClientError) -> ServiceError {
    warn!(%entity, error = %source, "remote resolution failed");
    ServiceError::Upstream { entity, source }
}
