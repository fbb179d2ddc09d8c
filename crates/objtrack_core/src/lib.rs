//! Core domain logic for monthly objective tracking.
//! This crate is the single source of truth for lifecycle and closure
//! invariants; presentation layers only call the services exported here.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod stats;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::objective::{
    Category, Objective, ObjectiveDraft, ObjectiveId, ObjectiveStatus, ObjectiveValidationError,
    ValidationOutcome, SUCCESS_THRESHOLD_PERCENT,
};
pub use model::period::{Period, PeriodParseError, PeriodState};
pub use repo::memory_store::MemoryObjectiveStore;
pub use repo::objective_store::{ObjectiveStore, SqliteObjectiveStore, StoreError, StoreResult};
pub use service::closure_service::ClosureService;
pub use service::objective_service::{ObjectiveError, ObjectiveService};
pub use service::report_service::ReportService;
pub use stats::{MonthlyReport, PeriodAggregates, PeriodHistory};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
