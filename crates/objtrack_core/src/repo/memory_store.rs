//! In-memory objective store.
//!
//! Drop-in substitute for the SQLite store, used by tests and by
//! collaborators that want a scratch workspace without a database file.
//! Single-threaded by design; cloning the handle shares the same state.

use crate::model::objective::Objective;
use crate::model::period::{Period, PeriodState};
use crate::repo::objective_store::{check_collection, ObjectiveStore, StoreError, StoreResult};
use crate::stats::MonthlyReport;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

#[derive(Debug, Default)]
struct MemoryState {
    collections: BTreeMap<Period, Vec<Objective>>,
    closed: BTreeSet<Period>,
    active: Option<Period>,
    reports: BTreeMap<Period, MonthlyReport>,
}

/// Shared-handle in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectiveStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryObjectiveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectiveStore for MemoryObjectiveStore {
    fn load(&self, period: Period) -> StoreResult<Vec<Objective>> {
        let state = self.state.borrow();
        let objectives = state.collections.get(&period).cloned().unwrap_or_default();
        check_collection(period, &objectives)?;
        Ok(objectives)
    }

    fn save(&self, period: Period, objectives: &[Objective]) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if state.closed.contains(&period) {
            return Err(StoreError::PeriodLocked(period));
        }
        check_collection(period, objectives)?;
        state.collections.insert(period, objectives.to_vec());
        Ok(())
    }

    fn list_periods(&self) -> StoreResult<Vec<Period>> {
        let state = self.state.borrow();
        Ok(state.collections.keys().rev().copied().collect())
    }

    fn period_state(&self, period: Period) -> StoreResult<PeriodState> {
        if self.state.borrow().closed.contains(&period) {
            Ok(PeriodState::Closed)
        } else {
            Ok(PeriodState::Open)
        }
    }

    fn closed_periods(&self) -> StoreResult<BTreeSet<Period>> {
        Ok(self.state.borrow().closed.clone())
    }

    fn commit_closure(
        &self,
        period: Period,
        objectives: &[Objective],
        report: &MonthlyReport,
    ) -> StoreResult<()> {
        check_collection(period, objectives)?;

        let mut state = self.state.borrow_mut();
        if !state.closed.insert(period) {
            return Err(StoreError::PeriodLocked(period));
        }
        state.collections.insert(period, objectives.to_vec());
        state.reports.insert(period, *report);
        Ok(())
    }

    fn active_period(&self) -> StoreResult<Option<Period>> {
        Ok(self.state.borrow().active)
    }

    fn set_active_period(&self, period: Period) -> StoreResult<()> {
        self.state.borrow_mut().active = Some(period);
        Ok(())
    }

    fn monthly_report(&self, period: Period) -> StoreResult<Option<MonthlyReport>> {
        Ok(self.state.borrow().reports.get(&period).copied())
    }
}
