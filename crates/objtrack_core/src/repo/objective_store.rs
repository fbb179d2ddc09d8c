//! Objective store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed persistence of objective collections partitioned by
//!   period, plus the closed-period registry and the active-period entry.
//! - Guard every write against the period lock; only `commit_closure` may
//!   touch a period while locking it, and it does so in one transaction.
//!
//! # Invariants
//! - One `objectives_{period}` entry per period; whole-collection
//!   overwrite, last-writer-wins.
//! - A collection only contains objectives belonging to its period.
//! - Absence of data is an empty collection, never an error.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::objective::Objective;
use crate::model::period::{Period, PeriodState};
use crate::stats::MonthlyReport;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

const KV_TABLE: &str = "kv_entries";
const CLOSED_PERIODS_KEY: &str = "closed_periods";
const ACTIVE_PERIOD_KEY: &str = "active_period";
const MONTHLY_REPORTS_KEY: &str = "monthly_reports";
const OBJECTIVES_KEY_PREFIX: &str = "objectives_";

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer error for objective persistence.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Attempted write into a closed period.
    PeriodLocked(Period),
    /// Persisted or incoming data violates a structural invariant.
    InvalidData(String),
    /// Connection has not been migrated to the expected schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::PeriodLocked(period) => {
                write!(f, "period {period} is closed and can no longer be modified")
            }
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed storage contract for objective collections and period lock state.
///
/// Implementations persist whole collections per period; there are no
/// row-level updates, so callers always operate on freshly loaded data.
pub trait ObjectiveStore {
    /// Loads the ordered collection of one period. Empty when absent.
    fn load(&self, period: Period) -> StoreResult<Vec<Objective>>;

    /// Overwrites the collection of one period.
    ///
    /// Fails with [`StoreError::PeriodLocked`] when the period is closed;
    /// the closure workflow uses [`ObjectiveStore::commit_closure`] instead.
    fn save(&self, period: Period, objectives: &[Objective]) -> StoreResult<()>;

    /// Every period with a stored collection, descending, regardless of
    /// lock state.
    fn list_periods(&self) -> StoreResult<Vec<Period>>;

    fn period_state(&self, period: Period) -> StoreResult<PeriodState>;

    fn closed_periods(&self) -> StoreResult<BTreeSet<Period>>;

    /// Atomically persists the final collection and report of a period and
    /// adds it to the closed set.
    ///
    /// Re-checks the closed set inside the transaction and fails with
    /// [`StoreError::PeriodLocked`] when the period was closed in the
    /// meantime, so a period can never end up half-closed.
    fn commit_closure(
        &self,
        period: Period,
        objectives: &[Objective],
        report: &MonthlyReport,
    ) -> StoreResult<()>;

    /// The persisted "currently active period" entry, if any.
    fn active_period(&self) -> StoreResult<Option<Period>>;

    fn set_active_period(&self, period: Period) -> StoreResult<()>;

    /// The report stored when `period` was closed, if any.
    fn monthly_report(&self, period: Period) -> StoreResult<Option<MonthlyReport>>;
}

/// Builds the kv key holding one period's collection.
fn objectives_key(period: Period) -> String {
    format!("{OBJECTIVES_KEY_PREFIX}{period}")
}

/// Rejects collections that are inconsistent or belong to another period.
pub(crate) fn check_collection(period: Period, objectives: &[Objective]) -> StoreResult<()> {
    for objective in objectives {
        if objective.period != period {
            return Err(StoreError::InvalidData(format!(
                "objective {} belongs to period {}, not {period}",
                objective.id, objective.period
            )));
        }
        objective
            .check_consistency()
            .map_err(StoreError::InvalidData)?;
    }
    Ok(())
}

/// SQLite-backed objective store over the `kv_entries` table.
pub struct SqliteObjectiveStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteObjectiveStore<'conn> {
    /// Constructs a store from a migrated, ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the kv table is absent.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual_version = current_user_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let table_exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if table_exists == 0 {
            return Err(StoreError::MissingRequiredTable(KV_TABLE));
        }

        Ok(Self { conn })
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        read_json_on(self.conn, key)
    }
}

fn read_entry_on(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_entries WHERE key = ?1;", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn read_json_on<T: DeserializeOwned>(conn: &Connection, key: &str) -> StoreResult<Option<T>> {
    match read_entry_on(conn, key)? {
        Some(raw) => {
            let value = serde_json::from_str(&raw).map_err(|err| {
                StoreError::InvalidData(format!("entry `{key}` failed to decode: {err}"))
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn write_json_on<T: Serialize>(conn: &Connection, key: &str, value: &T) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|err| {
        StoreError::InvalidData(format!("entry `{key}` failed to encode: {err}"))
    })?;
    conn.execute(
        "INSERT INTO kv_entries (key, value, updated_at)
         VALUES (?1, ?2, strftime('%s', 'now') * 1000)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        [key, raw.as_str()],
    )?;
    Ok(())
}

fn closed_periods_on(conn: &Connection) -> StoreResult<BTreeSet<Period>> {
    Ok(read_json_on(conn, CLOSED_PERIODS_KEY)?.unwrap_or_default())
}

impl ObjectiveStore for SqliteObjectiveStore<'_> {
    fn load(&self, period: Period) -> StoreResult<Vec<Objective>> {
        let objectives: Vec<Objective> = self
            .read_json(&objectives_key(period))?
            .unwrap_or_default();
        check_collection(period, &objectives)?;
        Ok(objectives)
    }

    fn save(&self, period: Period, objectives: &[Objective]) -> StoreResult<()> {
        if self.period_state(period)?.is_closed() {
            return Err(StoreError::PeriodLocked(period));
        }
        check_collection(period, objectives)?;
        write_json_on(self.conn, &objectives_key(period), &objectives)
    }

    fn list_periods(&self) -> StoreResult<Vec<Period>> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM kv_entries WHERE key LIKE ?1 ORDER BY key DESC;",
        )?;
        let mut rows = stmt.query([format!("{OBJECTIVES_KEY_PREFIX}%")])?;

        let mut periods = Vec::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let suffix = &key[OBJECTIVES_KEY_PREFIX.len()..];
            let period = suffix.parse().map_err(|_| {
                StoreError::InvalidData(format!("entry key `{key}` has no valid period suffix"))
            })?;
            periods.push(period);
        }
        Ok(periods)
    }

    fn period_state(&self, period: Period) -> StoreResult<PeriodState> {
        if closed_periods_on(self.conn)?.contains(&period) {
            Ok(PeriodState::Closed)
        } else {
            Ok(PeriodState::Open)
        }
    }

    fn closed_periods(&self) -> StoreResult<BTreeSet<Period>> {
        closed_periods_on(self.conn)
    }

    fn commit_closure(
        &self,
        period: Period,
        objectives: &[Objective],
        report: &MonthlyReport,
    ) -> StoreResult<()> {
        check_collection(period, objectives)?;

        let tx = self.conn.unchecked_transaction()?;

        let mut closed = closed_periods_on(&tx)?;
        if !closed.insert(period) {
            return Err(StoreError::PeriodLocked(period));
        }

        let mut reports: BTreeMap<Period, MonthlyReport> =
            read_json_on(&tx, MONTHLY_REPORTS_KEY)?.unwrap_or_default();
        reports.insert(period, *report);

        write_json_on(&tx, &objectives_key(period), &objectives)?;
        write_json_on(&tx, CLOSED_PERIODS_KEY, &closed)?;
        write_json_on(&tx, MONTHLY_REPORTS_KEY, &reports)?;
        tx.commit()?;
        Ok(())
    }

    fn active_period(&self) -> StoreResult<Option<Period>> {
        match read_entry_on(self.conn, ACTIVE_PERIOD_KEY)? {
            Some(raw) => {
                let period = raw.parse().map_err(|_| {
                    StoreError::InvalidData(format!("active period `{raw}` is not a valid key"))
                })?;
                Ok(Some(period))
            }
            None => Ok(None),
        }
    }

    fn set_active_period(&self, period: Period) -> StoreResult<()> {
        conn_set_active_period(self.conn, period)
    }

    fn monthly_report(&self, period: Period) -> StoreResult<Option<MonthlyReport>> {
        let reports: BTreeMap<Period, MonthlyReport> =
            self.read_json(MONTHLY_REPORTS_KEY)?.unwrap_or_default();
        Ok(reports.get(&period).copied())
    }
}

fn conn_set_active_period(conn: &Connection, period: Period) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO kv_entries (key, value, updated_at)
         VALUES (?1, ?2, strftime('%s', 'now') * 1000)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        [ACTIVE_PERIOD_KEY, period.to_string().as_str()],
    )?;
    Ok(())
}
