//! Loan application orchestration service.
//!
//! Persists loan application records and enriches them with borrower, loan
//! product, and vendor data resolved from sibling microservices at write time.

pub mod config;
pub mod error;
pub mod loans;
pub mod telemetry;
