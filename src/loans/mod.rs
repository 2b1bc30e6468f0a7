//! Loan application orchestration: CRUD over stored applications plus
//! remote-entity resolution against the user and admin services.

pub mod clients;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use clients::{AdminCatalog, ClientError, HttpAdminCatalog, HttpUserDirectory, UserDirectory};
pub use domain::{
    ApplicationId, ApplicationStatus, Borrower, FieldPatch, InvalidStatus, LoanApplication,
    LoanApplicationUpdate, LoanProduct, NewLoanApplication, PatchSet, Vendor,
};
pub use repository::{LoanApplicationStore, MemoryLoanStore, RepositoryError};
pub use router::loan_router;
pub use service::{EntityKind, LoanApplicationService, ServiceError};
