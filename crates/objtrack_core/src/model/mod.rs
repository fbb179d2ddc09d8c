//! Domain model for monthly objective tracking.
//!
//! # Responsibility
//! - Define the canonical objective record and its lifecycle fields.
//! - Define the period key that partitions storage and locking.
//!
//! # Invariants
//! - Every objective is identified by a stable `ObjectiveId`.
//! - An objective's `period` never changes after creation.
//! - Evaluation fields are all `None` or all `Some`, never mixed.

pub mod objective;
pub mod period;
