mod outcome;
mod pendency_resolver;
mod photo_linker;
mod reconciliation_service;

pub use outcome::{LinkedPhoto, ReconciliationOutcome, SkipReason};
pub use reconciliation_service::{PhotoCorrelation, PhotoReconciliationService};
