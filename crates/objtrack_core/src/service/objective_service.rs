//! Objective lifecycle service.
//!
//! # Responsibility
//! - Provide the create/edit/delete/evaluate operations of the objective
//!   state machine, plus period-scoped reads.
//! - Enforce the period lock and the pending-only mutability rule before
//!   any write reaches the store.
//!
//! # Invariants
//! - Every mutation operates on a freshly loaded collection (whole-
//!   collection read-modify-write, last-writer-wins).
//! - `Pending -> Validated` is the only status transition and it is
//!   one-way; nothing here reverts a validated objective.
//! - A closed period rejects create/edit/delete/evaluate with
//!   `PeriodLocked`; reads stay available.

use crate::model::objective::{
    Objective, ObjectiveDraft, ObjectiveId, ObjectiveStatus, ObjectiveValidationError,
};
use crate::model::period::Period;
use crate::repo::objective_store::{ObjectiveStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for objective lifecycle and closure use-cases.
#[derive(Debug)]
pub enum ObjectiveError {
    /// Attempted mutation on a closed period.
    PeriodLocked(Period),
    /// No objective with this id in the period's collection.
    NotFound(ObjectiveId),
    /// Transition not legal from the objective's current status.
    InvalidState {
        id: ObjectiveId,
        status: ObjectiveStatus,
    },
    /// Double-closure attempt; surfaced, never swallowed.
    AlreadyClosed(Period),
    /// Closure refused while pending objectives remain.
    PendingRemain { period: Period, pending: usize },
    /// Malformed input (non-positive target, non-finite evaluation, ...).
    Validation(ObjectiveValidationError),
    /// Persistence-layer failure.
    Store(StoreError),
}

impl Display for ObjectiveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeriodLocked(period) => {
                write!(f, "period {period} is closed and can no longer be modified")
            }
            Self::NotFound(id) => write!(f, "objective not found: {id}"),
            Self::InvalidState { id, status } => {
                write!(f, "objective {id} is {status:?} and cannot be modified")
            }
            Self::AlreadyClosed(period) => write!(f, "period {period} is already closed"),
            Self::PendingRemain { period, pending } => write!(
                f,
                "period {period} still has {pending} pending objective(s); evaluate them before closing"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ObjectiveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ObjectiveError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::PeriodLocked(period) => Self::PeriodLocked(period),
            other => Self::Store(other),
        }
    }
}

impl From<ObjectiveValidationError> for ObjectiveError {
    fn from(value: ObjectiveValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Lifecycle service facade over a storage port.
pub struct ObjectiveService<S: ObjectiveStore> {
    store: S,
}

impl<S: ObjectiveStore> ObjectiveService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a pending objective in `period`.
    pub fn create_objective(
        &self,
        period: Period,
        draft: ObjectiveDraft,
    ) -> Result<Objective, ObjectiveError> {
        self.ensure_open(period)?;

        let objective = Objective::new(period, draft)?;
        let mut objectives = self.store.load(period)?;
        objectives.push(objective.clone());
        self.store.save(period, &objectives)?;

        info!(
            "event=objective_created module=service period={period} id={}",
            objective.id
        );
        Ok(objective)
    }

    /// Replaces the editable fields of a pending objective.
    pub fn edit_objective(
        &self,
        id: ObjectiveId,
        period: Period,
        draft: ObjectiveDraft,
    ) -> Result<Objective, ObjectiveError> {
        self.ensure_open(period)?;

        let mut objectives = self.store.load(period)?;
        let objective = find_mut(&mut objectives, id)?;
        ensure_pending(objective)?;
        objective.apply_draft(draft)?;
        let edited = objective.clone();

        self.store.save(period, &objectives)?;
        Ok(edited)
    }

    /// Removes a pending objective.
    ///
    /// Returns `Ok(false)` when no objective with this id exists; deleting
    /// something already gone is not an error in this interface.
    pub fn delete_objective(
        &self,
        id: ObjectiveId,
        period: Period,
    ) -> Result<bool, ObjectiveError> {
        self.ensure_open(period)?;

        let mut objectives = self.store.load(period)?;
        let Some(position) = objectives.iter().position(|o| o.id == id) else {
            return Ok(false);
        };
        ensure_pending(&objectives[position])?;

        objectives.remove(position);
        self.store.save(period, &objectives)?;
        info!("event=objective_deleted module=service period={period} id={id}");
        Ok(true)
    }

    /// Evaluates a pending objective and transitions it to validated.
    ///
    /// The transition is one-way: a second evaluation of the same id fails
    /// with `InvalidState`.
    pub fn evaluate_objective(
        &self,
        id: ObjectiveId,
        period: Period,
        evaluated_value: f64,
    ) -> Result<Objective, ObjectiveError> {
        self.ensure_open(period)?;

        let mut objectives = self.store.load(period)?;
        let objective = find_mut(&mut objectives, id)?;
        ensure_pending(objective)?;
        objective.record_evaluation(evaluated_value)?;
        let evaluated = objective.clone();

        self.store.save(period, &objectives)?;
        info!(
            "event=objective_evaluated module=service period={period} id={id} percent={} outcome={:?}",
            evaluated.achievement_percent.unwrap_or(0),
            evaluated.outcome,
        );
        Ok(evaluated)
    }

    /// Loads a period's objectives in insertion order. Works on closed
    /// periods; reading history is always allowed.
    pub fn get_objectives(&self, period: Period) -> Result<Vec<Objective>, ObjectiveError> {
        Ok(self.store.load(period)?)
    }

    pub fn is_period_closed(&self, period: Period) -> Result<bool, ObjectiveError> {
        Ok(self.store.period_state(period)?.is_closed())
    }

    /// Periods with stored objectives, newest first.
    pub fn list_periods(&self) -> Result<Vec<Period>, ObjectiveError> {
        Ok(self.store.list_periods()?)
    }

    /// The active period, defaulting to (and persisting) the current
    /// calendar month when none is stored yet.
    pub fn active_period(&self) -> Result<Period, ObjectiveError> {
        if let Some(period) = self.store.active_period()? {
            return Ok(period);
        }
        let current = Period::current();
        self.store.set_active_period(current)?;
        Ok(current)
    }

    pub fn set_active_period(&self, period: Period) -> Result<(), ObjectiveError> {
        Ok(self.store.set_active_period(period)?)
    }

    /// Resets the active period to the current calendar month.
    pub fn reset_active_period(&self) -> Result<Period, ObjectiveError> {
        let current = Period::current();
        self.store.set_active_period(current)?;
        Ok(current)
    }

    fn ensure_open(&self, period: Period) -> Result<(), ObjectiveError> {
        if self.store.period_state(period)?.is_closed() {
            warn!("event=mutation_rejected module=service period={period} reason=period_locked");
            return Err(ObjectiveError::PeriodLocked(period));
        }
        Ok(())
    }
}

fn find_mut(
    objectives: &mut [Objective],
    id: ObjectiveId,
) -> Result<&mut Objective, ObjectiveError> {
    objectives
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or(ObjectiveError::NotFound(id))
}

fn ensure_pending(objective: &Objective) -> Result<(), ObjectiveError> {
    if !objective.is_pending() {
        return Err(ObjectiveError::InvalidState {
            id: objective.id,
            status: objective.status,
        });
    }
    Ok(())
}
