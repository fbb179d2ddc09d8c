//! Calendar-month period key.
//!
//! # Responsibility
//! - Identify a calendar month (`YYYY-MM`) with total ordering.
//! - Provide previous/next/current arithmetic for month navigation.
//! - Model the one-way lock dimension as `PeriodState`.
//!
//! # Invariants
//! - `month` is always in `1..=12`.
//! - Ordering is chronological (`2025-12 < 2026-01`).
//! - `PeriodState` has no transition back from `Closed` to `Open`.

use chrono::{Datelike, Utc};
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month, the unit of locking and aggregation.
///
/// Serialized as its `YYYY-MM` string form so persisted keys stay
/// human-readable and sort chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

/// Rejected period input (malformed key or out-of-range month).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodParseError {
    input: String,
}

impl Display for PeriodParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid period `{}`; expected YYYY-MM", self.input)
    }
}

impl Error for PeriodParseError {}

impl Period {
    /// Creates a period from explicit parts.
    ///
    /// # Errors
    /// - Rejects `month` outside `1..=12`.
    /// - Rejects negative years; the key format has no sign position.
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodParseError> {
        if !(1..=12).contains(&month) || year < 0 {
            return Err(PeriodParseError {
                input: format!("{year:04}-{month:02}"),
            });
        }
        Ok(Self { year, month })
    }

    /// Returns the period containing the current UTC date.
    pub fn current() -> Self {
        let today = Utc::now().date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    /// Returns the previous calendar month.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Returns the next calendar month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Whether this period is strictly before the current one.
    pub fn is_past(self) -> bool {
        self < Self::current()
    }

    /// Whether this period is the current calendar month.
    pub fn is_current(self) -> bool {
        self == Self::current()
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PeriodParseError {
            input: s.to_string(),
        };

        let (year_part, month_part) = s.split_once('-').ok_or_else(err)?;
        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(err());
        }
        let year: i32 = year_part.parse().map_err(|_| err())?;
        let month: u32 = month_part.parse().map_err(|_| err())?;
        Period::new(year, month).map_err(|_| err())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct PeriodVisitor;

impl<'de> Visitor<'de> for PeriodVisitor {
    type Value = Period;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a period key in YYYY-MM form")
    }

    fn visit_str<E: DeError>(self, value: &str) -> Result<Period, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(PeriodVisitor)
    }
}

/// Lock status of a period.
///
/// Deliberately a tagged state instead of a boolean: closure is a one-way
/// sign-off and no API re-opens a closed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodState {
    /// Objectives may be created, edited, deleted and evaluated.
    Open,
    /// The period is frozen; every mutation is rejected.
    Closed,
}

impl PeriodState {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::{Period, PeriodState};

    #[test]
    fn parse_and_display_roundtrip() {
        let period: Period = "2026-08".parse().unwrap();
        assert_eq!(period.year(), 2026);
        assert_eq!(period.month(), 8);
        assert_eq!(period.to_string(), "2026-08");
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        for input in ["2026", "2026-13", "2026-00", "26-08", "2026-8", "abcd-ef"] {
            assert!(input.parse::<Period>().is_err(), "accepted `{input}`");
        }
    }

    #[test]
    fn ordering_is_chronological() {
        let december: Period = "2025-12".parse().unwrap();
        let january: Period = "2026-01".parse().unwrap();
        assert!(december < january);
    }

    #[test]
    fn previous_and_next_cross_year_boundaries() {
        let january: Period = "2026-01".parse().unwrap();
        assert_eq!(january.previous().to_string(), "2025-12");
        assert_eq!(january.next().to_string(), "2026-02");
        assert_eq!(january.previous().next(), january);
    }

    #[test]
    fn serde_uses_string_form() {
        let period: Period = "2026-08".parse().unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2026-08\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }

    #[test]
    fn state_reports_closed() {
        assert!(!PeriodState::Open.is_closed());
        assert!(PeriodState::Closed.is_closed());
    }
}
