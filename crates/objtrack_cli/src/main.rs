//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `objtrack_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use objtrack_core::db::open_db_in_memory;
use objtrack_core::SqliteObjectiveStore;

fn main() {
    println!("objtrack_core version={}", objtrack_core::core_version());

    // Open an in-memory database to prove migrations and the store
    // constructor are wired, independently of any UI runtime.
    match open_db_in_memory() {
        Ok(conn) => match SqliteObjectiveStore::try_new(&conn) {
            Ok(_) => println!("objtrack_core store=ready"),
            Err(err) => println!("objtrack_core store=error detail={err}"),
        },
        Err(err) => println!("objtrack_core db=error detail={err}"),
    }
}
