//! Month closure workflow.
//!
//! # Responsibility
//! - Perform the irreversible close-out of one period: final collection
//!   write, report snapshot and lock entry in a single transaction.
//!
//! # Invariants
//! - A period is closed at most once; re-closure fails with
//!   `AlreadyClosed` and leaves stored data untouched.
//! - Closure refuses to run while pending objectives remain, so every
//!   record in a closed period carries complete evaluation results.
//! - There is no unlock counterpart anywhere in the API.

use crate::model::objective::now_epoch_ms;
use crate::model::period::Period;
use crate::repo::objective_store::ObjectiveStore;
use crate::service::objective_service::ObjectiveError;
use crate::stats::{aggregate, MonthlyReport};
use log::info;

/// Closure workflow facade over a storage port.
pub struct ClosureService<S: ObjectiveStore> {
    store: S,
}

impl<S: ObjectiveStore> ClosureService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Closes out `period` and returns the stored report snapshot.
    ///
    /// # Errors
    /// - `AlreadyClosed` when the period is in the closed set.
    /// - `PendingRemain` while unevaluated objectives exist; the caller is
    ///   expected to evaluate (or delete) them first.
    pub fn close_month(&self, period: Period) -> Result<MonthlyReport, ObjectiveError> {
        if self.store.period_state(period)?.is_closed() {
            return Err(ObjectiveError::AlreadyClosed(period));
        }

        let objectives = self.store.load(period)?;
        let pending = objectives.iter().filter(|o| o.is_pending()).count();
        if pending > 0 {
            return Err(ObjectiveError::PendingRemain { period, pending });
        }

        let report = MonthlyReport {
            period,
            aggregates: aggregate(&objectives),
            closed_at: now_epoch_ms(),
        };
        self.store.commit_closure(period, &objectives, &report)?;

        info!(
            "event=month_closed module=service period={period} total={} global_percent={}",
            report.aggregates.total, report.aggregates.global_percent
        );
        Ok(report)
    }
}
