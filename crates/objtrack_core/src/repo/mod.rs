//! Storage port and persistence implementations.
//!
//! # Responsibility
//! - Define the keyed, period-partitioned storage contract services rely on.
//! - Keep SQLite and payload-encoding details inside the persistence layer.
//!
//! # Invariants
//! - Write paths validate record consistency before persisting.
//! - Read paths reject invalid persisted state instead of masking it.
//! - The closed-period set only ever grows.

pub mod memory_store;
pub mod objective_store;
