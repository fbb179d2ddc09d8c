//! Read-side aggregation over a period's objectives.
//!
//! # Responsibility
//! - Compute derived statistics (success counts, mean achievement, rates)
//!   from loaded objectives. No stored state of its own.
//! - Define the report snapshot persisted at month closure.
//!
//! # Invariants
//! - Only `Validated` objectives contribute to aggregates.
//! - Empty inputs yield zeroed aggregates, never a division error.

use crate::model::objective::{Objective, ValidationOutcome};
use crate::model::period::Period;
use serde::{Deserialize, Serialize};

/// Aggregates over the validated subset of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAggregates {
    /// Number of validated objectives.
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Rounded mean of the stored achievement percentages; 0 when nothing
    /// is validated yet ("no data" is a normal state, not a fault).
    pub global_percent: i32,
}

impl PeriodAggregates {
    pub const EMPTY: Self = Self {
        total: 0,
        success_count: 0,
        failure_count: 0,
        global_percent: 0,
    };
}

/// Per-period row for historical browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodHistory {
    pub period: Period,
    /// All objectives recorded for the period, whatever their status.
    pub total: usize,
    pub validated_count: usize,
    pub success_count: usize,
    /// `round(success / validated * 100)`; 0 when nothing is validated.
    pub rate: i32,
}

/// Snapshot stored when a month is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub period: Period,
    pub aggregates: PeriodAggregates,
    /// Unix epoch milliseconds of the closure.
    pub closed_at: i64,
}

/// Computes aggregates over the validated subset of `objectives`.
pub fn aggregate(objectives: &[Objective]) -> PeriodAggregates {
    let validated: Vec<&Objective> = objectives.iter().filter(|o| !o.is_pending()).collect();
    if validated.is_empty() {
        return PeriodAggregates::EMPTY;
    }

    let success_count = validated
        .iter()
        .filter(|o| o.outcome == Some(ValidationOutcome::Success))
        .count();
    let percent_sum: i64 = validated
        .iter()
        .map(|o| i64::from(o.achievement_percent.unwrap_or(0)))
        .sum();
    let global_percent = rounded_ratio(percent_sum, validated.len() as i64);

    PeriodAggregates {
        total: validated.len(),
        success_count,
        failure_count: validated.len() - success_count,
        global_percent,
    }
}

/// Computes the historical row for one period's objectives.
pub fn history_row(period: Period, objectives: &[Objective]) -> PeriodHistory {
    let validated_count = objectives.iter().filter(|o| !o.is_pending()).count();
    let success_count = objectives
        .iter()
        .filter(|o| o.outcome == Some(ValidationOutcome::Success))
        .count();
    let rate = if validated_count == 0 {
        0
    } else {
        rounded_ratio(success_count as i64 * 100, validated_count as i64)
    };

    PeriodHistory {
        period,
        total: objectives.len(),
        validated_count,
        success_count,
        rate,
    }
}

/// Renders a plain-text debrief of one period.
///
/// Covers the validated objectives only, in storage order, grouped by
/// outcome after the headline aggregates.
pub fn render_summary(period: Period, objectives: &[Objective]) -> String {
    let aggregates = aggregate(objectives);
    let verdict = if aggregates.global_percent >= crate::model::objective::SUCCESS_THRESHOLD_PERCENT
    {
        "on track"
    } else {
        "below target"
    };

    let mut summary = String::new();
    summary.push_str(&format!("Monthly debrief - {period}\n"));
    summary.push_str(&format!(
        "Average achievement: {}% ({verdict})\n",
        aggregates.global_percent
    ));
    summary.push_str(&format!(
        "Validated objectives: {} ({} succeeded, {} failed)\n",
        aggregates.total, aggregates.success_count, aggregates.failure_count
    ));

    for (header, outcome) in [
        ("Succeeded", ValidationOutcome::Success),
        ("Failed", ValidationOutcome::Failure),
    ] {
        let group: Vec<&Objective> = objectives
            .iter()
            .filter(|o| o.outcome == Some(outcome))
            .collect();
        if group.is_empty() {
            continue;
        }
        summary.push_str(&format!("\n{header}:\n"));
        for objective in group {
            summary.push_str(&format!(
                "- {} ({}): {}/{} -> {}%\n",
                objective.description,
                objective.owner,
                objective.evaluated_value.unwrap_or(0.0),
                objective.target_value,
                objective.achievement_percent.unwrap_or(0),
            ));
        }
    }

    summary
}

fn rounded_ratio(numerator: i64, denominator: i64) -> i32 {
    (numerator as f64 / denominator as f64).round() as i32
}
