//! Reporting and aggregation reads.
//!
//! Pure read-side: loads collections through the storage port and derives
//! statistics with the `stats` module. Never writes.

use crate::model::period::Period;
use crate::repo::objective_store::ObjectiveStore;
use crate::service::objective_service::ObjectiveError;
use crate::stats::{self, MonthlyReport, PeriodAggregates, PeriodHistory};

/// Reporting service facade over a storage port.
pub struct ReportService<S: ObjectiveStore> {
    store: S,
}

impl<S: ObjectiveStore> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Aggregates over the validated subset of one period.
    pub fn aggregates(&self, period: Period) -> Result<PeriodAggregates, ObjectiveError> {
        let objectives = self.store.load(period)?;
        Ok(stats::aggregate(&objectives))
    }

    /// One history row per stored period, newest first.
    pub fn history(&self) -> Result<Vec<PeriodHistory>, ObjectiveError> {
        let mut rows = Vec::new();
        for period in self.store.list_periods()? {
            let objectives = self.store.load(period)?;
            rows.push(stats::history_row(period, &objectives));
        }
        Ok(rows)
    }

    /// The report stored at closure time, if the period is closed.
    pub fn monthly_report(&self, period: Period) -> Result<Option<MonthlyReport>, ObjectiveError> {
        Ok(self.store.monthly_report(period)?)
    }

    /// Plain-text debrief of one period's validated objectives.
    pub fn render_summary(&self, period: Period) -> Result<String, ObjectiveError> {
        let objectives = self.store.load(period)?;
        Ok(stats::render_summary(period, &objectives))
    }
}
