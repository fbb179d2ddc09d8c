//! Objective domain record.
//!
//! # Responsibility
//! - Define the canonical objective shape shared by storage and services.
//! - Own the evaluation transition math (percentage, outcome, stamps).
//! - Validate drafts on write and persisted records on read-back.
//!
//! # Invariants
//! - `id` is stable and never reused for another objective.
//! - `period` never changes after creation.
//! - `evaluated_value`, `outcome` and `achievement_percent` are all `None`
//!   or all `Some`; a `Validated` objective always carries all three.

use crate::model::period::Period;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one objective.
pub type ObjectiveId = Uuid;

/// Achievement percentage at or above which an evaluation counts as success.
///
/// Policy constant, not configurable per objective. The comparison is made
/// on the unclamped percentage; overshooting the target is still a success.
pub const SUCCESS_THRESHOLD_PERCENT: i32 = 60;

/// Who the objective is assigned to, by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    IndividualContributor,
    Team,
    Lead,
}

/// Lifecycle status of one objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    /// Created, editable, not yet evaluated.
    Pending,
    /// Evaluated (or closed out); immutable from here on.
    Validated,
}

/// Success/failure classification of an evaluated objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Success,
    Failure,
}

/// Rejected objective input.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectiveValidationError {
    /// Target must be a finite number strictly greater than zero, so the
    /// percentage division at evaluation time can never blow up.
    NonPositiveTarget(f64),
    /// Evaluated value must be a finite number (zero is allowed).
    NonFiniteEvaluation(f64),
    EmptyOwner,
    EmptyDescription,
}

impl Display for ObjectiveValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveTarget(value) => {
                write!(f, "target value must be finite and > 0, got {value}")
            }
            Self::NonFiniteEvaluation(value) => {
                write!(f, "evaluated value must be a finite number, got {value}")
            }
            Self::EmptyOwner => write!(f, "owner name cannot be empty"),
            Self::EmptyDescription => write!(f, "objective description cannot be empty"),
        }
    }
}

impl Error for ObjectiveValidationError {}

/// Caller-provided fields for creating or editing an objective.
///
/// Lifecycle fields (`status`, evaluation results, stamps) are owned by the
/// core and never accepted from drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveDraft {
    pub owner: String,
    pub description: String,
    pub category: Category,
    pub target_value: f64,
    pub due_date: NaiveDate,
}

impl ObjectiveDraft {
    /// Validates draft fields before they reach storage.
    pub fn validate(&self) -> Result<(), ObjectiveValidationError> {
        if self.owner.trim().is_empty() {
            return Err(ObjectiveValidationError::EmptyOwner);
        }
        if self.description.trim().is_empty() {
            return Err(ObjectiveValidationError::EmptyDescription);
        }
        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return Err(ObjectiveValidationError::NonPositiveTarget(
                self.target_value,
            ));
        }
        Ok(())
    }
}

/// Canonical objective record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Stable creation-time id.
    pub id: ObjectiveId,
    /// Owning calendar month; immutable after creation.
    pub period: Period,
    pub owner: String,
    pub description: String,
    pub category: Category,
    pub target_value: f64,
    pub due_date: NaiveDate,
    pub status: ObjectiveStatus,
    /// Set only at evaluation, together with `outcome` and
    /// `achievement_percent`.
    pub evaluated_value: Option<f64>,
    pub outcome: Option<ValidationOutcome>,
    /// `round(evaluated / target * 100)`, stored unclamped.
    pub achievement_percent: Option<i32>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Stamped on edit and evaluation; `None` until the first mutation.
    pub updated_at: Option<i64>,
    /// Stamped exactly once, at the pending-to-validated transition.
    pub validated_at: Option<i64>,
}

impl Objective {
    /// Creates a new pending objective from a validated draft.
    pub fn new(period: Period, draft: ObjectiveDraft) -> Result<Self, ObjectiveValidationError> {
        draft.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            period,
            owner: draft.owner,
            description: draft.description,
            category: draft.category,
            target_value: draft.target_value,
            due_date: draft.due_date,
            status: ObjectiveStatus::Pending,
            evaluated_value: None,
            outcome: None,
            achievement_percent: None,
            created_at: now_epoch_ms(),
            updated_at: None,
            validated_at: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == ObjectiveStatus::Pending
    }

    /// Replaces the editable fields and stamps `updated_at`.
    ///
    /// Callers are responsible for the lifecycle guard (`Pending` only);
    /// this method only moves validated draft data into the record.
    pub fn apply_draft(&mut self, draft: ObjectiveDraft) -> Result<(), ObjectiveValidationError> {
        draft.validate()?;
        self.owner = draft.owner;
        self.description = draft.description;
        self.category = draft.category;
        self.target_value = draft.target_value;
        self.due_date = draft.due_date;
        self.updated_at = Some(now_epoch_ms());
        Ok(())
    }

    /// Records an evaluation and performs the one-way transition to
    /// `Validated`.
    ///
    /// The stored percentage is not clamped; the threshold comparison uses
    /// the raw value, so an overshoot (say 150%) still classifies as
    /// success and an evaluation of `0` classifies as failure at 0%.
    pub fn record_evaluation(&mut self, value: f64) -> Result<(), ObjectiveValidationError> {
        if !value.is_finite() {
            return Err(ObjectiveValidationError::NonFiniteEvaluation(value));
        }

        let percent = achievement_percent(self.target_value, value);
        let now = now_epoch_ms();
        self.evaluated_value = Some(value);
        self.achievement_percent = Some(percent);
        self.outcome = Some(outcome_for_percent(percent));
        self.status = ObjectiveStatus::Validated;
        self.validated_at = Some(now);
        self.updated_at = Some(now);
        Ok(())
    }

    /// Rejects structurally inconsistent records.
    ///
    /// Used by storage on both write and read-back, so a corrupted payload
    /// surfaces as an error instead of flowing into aggregation.
    pub fn check_consistency(&self) -> Result<(), String> {
        if !self.target_value.is_finite() || self.target_value <= 0.0 {
            return Err(format!(
                "objective {} has non-positive target {}",
                self.id, self.target_value
            ));
        }

        let set_count = [
            self.evaluated_value.is_some(),
            self.outcome.is_some(),
            self.achievement_percent.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if set_count != 0 && set_count != 3 {
            return Err(format!(
                "objective {} has partially set evaluation fields",
                self.id
            ));
        }

        match self.status {
            ObjectiveStatus::Pending if set_count != 0 => Err(format!(
                "objective {} is pending but carries evaluation results",
                self.id
            )),
            ObjectiveStatus::Validated if set_count != 3 => Err(format!(
                "objective {} is validated without evaluation results",
                self.id
            )),
            ObjectiveStatus::Validated if self.validated_at.is_none() => {
                Err(format!("objective {} is validated without a stamp", self.id))
            }
            _ => Ok(()),
        }
    }
}

/// Rounded, unclamped achievement percentage.
pub fn achievement_percent(target: f64, evaluated: f64) -> i32 {
    (evaluated / target * 100.0).round() as i32
}

/// Classifies a percentage against [`SUCCESS_THRESHOLD_PERCENT`].
///
/// The boundary is inclusive: exactly 60% is a success.
pub fn outcome_for_percent(percent: i32) -> ValidationOutcome {
    if percent >= SUCCESS_THRESHOLD_PERCENT {
        ValidationOutcome::Success
    } else {
        ValidationOutcome::Failure
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::{
        achievement_percent, outcome_for_percent, Category, Objective, ObjectiveDraft,
        ObjectiveStatus, ObjectiveValidationError, ValidationOutcome,
    };
    use crate::model::period::Period;
    use chrono::NaiveDate;

    fn draft(target: f64) -> ObjectiveDraft {
        ObjectiveDraft {
            owner: "Nadia".to_string(),
            description: "Close twelve support tickets".to_string(),
            category: Category::IndividualContributor,
            target_value: target,
            due_date: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
        }
    }

    fn period() -> Period {
        "2026-08".parse().unwrap()
    }

    #[test]
    fn new_objective_starts_pending_with_null_evaluation() {
        let objective = Objective::new(period(), draft(100.0)).unwrap();
        assert_eq!(objective.status, ObjectiveStatus::Pending);
        assert!(objective.evaluated_value.is_none());
        assert!(objective.outcome.is_none());
        assert!(objective.achievement_percent.is_none());
        assert!(objective.validated_at.is_none());
        assert!(objective.created_at > 0);
        objective.check_consistency().unwrap();
    }

    #[test]
    fn draft_validation_rejects_bad_targets() {
        for target in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = Objective::new(period(), draft(target)).unwrap_err();
            assert!(matches!(
                err,
                ObjectiveValidationError::NonPositiveTarget(_)
            ));
        }
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        assert_eq!(achievement_percent(100.0, 59.0), 59);
        assert_eq!(
            outcome_for_percent(achievement_percent(100.0, 59.0)),
            ValidationOutcome::Failure
        );
        assert_eq!(achievement_percent(100.0, 60.0), 60);
        assert_eq!(
            outcome_for_percent(achievement_percent(100.0, 60.0)),
            ValidationOutcome::Success
        );
    }

    #[test]
    fn fractional_targets_round_before_classification() {
        // 2 out of 3 rounds up to 67%, above the threshold.
        assert_eq!(achievement_percent(3.0, 2.0), 67);
        assert_eq!(outcome_for_percent(67), ValidationOutcome::Success);
    }

    #[test]
    fn overshoot_is_stored_unclamped() {
        let mut objective = Objective::new(period(), draft(100.0)).unwrap();
        objective.record_evaluation(150.0).unwrap();
        assert_eq!(objective.achievement_percent, Some(150));
        assert_eq!(objective.outcome, Some(ValidationOutcome::Success));
    }

    #[test]
    fn zero_evaluation_is_a_valid_failure() {
        let mut objective = Objective::new(period(), draft(100.0)).unwrap();
        objective.record_evaluation(0.0).unwrap();
        assert_eq!(objective.achievement_percent, Some(0));
        assert_eq!(objective.outcome, Some(ValidationOutcome::Failure));
        assert_eq!(objective.status, ObjectiveStatus::Validated);
        assert!(objective.validated_at.is_some());
        objective.check_consistency().unwrap();
    }

    #[test]
    fn non_finite_evaluation_is_rejected_without_mutation() {
        let mut objective = Objective::new(period(), draft(100.0)).unwrap();
        let err = objective.record_evaluation(f64::NAN).unwrap_err();
        assert!(matches!(
            err,
            ObjectiveValidationError::NonFiniteEvaluation(_)
        ));
        assert_eq!(objective.status, ObjectiveStatus::Pending);
        assert!(objective.evaluated_value.is_none());
    }

    #[test]
    fn consistency_check_rejects_partial_evaluation_fields() {
        let mut objective = Objective::new(period(), draft(100.0)).unwrap();
        objective.achievement_percent = Some(40);
        assert!(objective.check_consistency().is_err());

        let mut validated = Objective::new(period(), draft(100.0)).unwrap();
        validated.status = ObjectiveStatus::Validated;
        assert!(validated.check_consistency().is_err());
    }
}
