//! Adoption applications and the availability reconciler behind them.
//!
//! Commands (`submit`, `revise`, `approve`, `reject`, `delete`) run inside a single store
//! transaction with their reconciliation pass, so two approvals racing for the same pet
//! resolve to exactly one winner. Queries are always narrowed by the caller's
//! [`ApplicationScope`](crate::access::ApplicationScope).

pub mod domain;
pub mod reconciler;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AdoptionApplication, ApplicantContact, ApplicationChanges, ApplicationFilter, ApplicationId,
    ApplicationRevision, ApplicationStatus, ApplicationSubmission, ApplicationView,
};
pub use reconciler::Reconciliation;
pub use router::application_router;
pub use service::{AdoptionError, AdoptionWorkflow, Decision};
