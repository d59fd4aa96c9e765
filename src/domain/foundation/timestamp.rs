//! Canonical instants and the lenient normalizer for stored time values.
//!
//! Everything downstream of the record-store mapping compares and adds plain
//! epoch milliseconds. Stored documents, however, carry whatever shape the
//! writer happened to use: epoch numbers, ISO strings, or the store's native
//! `{seconds, nanoseconds}` object. [`RawInstant`] accepts all of them and
//! [`RawInstant::normalize`] collapses them into an [`EpochMillis`].
//!
//! Normalization never fails. Input that cannot be interpreted resolves to
//! the supplied "now", because upstream data quality is not guaranteed.

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MILLIS_PER_MINUTE: i64 = 60_000;
pub const MILLIS_PER_HOUR: i64 = 3_600_000;
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Point in time as milliseconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochMillis(i64);

impl EpochMillis {
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    /// Returns `None` when the value is outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    pub fn plus_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    pub fn plus_days(&self, days: i64) -> Self {
        self.plus_millis(days.saturating_mul(MILLIS_PER_DAY))
    }

    pub fn plus_minutes(&self, minutes: i64) -> Self {
        self.plus_millis(minutes.saturating_mul(MILLIS_PER_MINUTE))
    }

    /// Adds whole calendar months, clamping to the last day of a shorter month.
    pub fn plus_calendar_months(&self, months: u32) -> Option<Self> {
        self.to_datetime()?
            .checked_add_months(Months::new(months))
            .map(Self::from_datetime)
    }

    /// Signed distance from `self` to `later`.
    pub fn millis_until(&self, later: EpochMillis) -> i64 {
        later.0.saturating_sub(self.0)
    }

    pub fn is_before(&self, other: EpochMillis) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: EpochMillis) -> bool {
        self.0 > other.0
    }

    /// Day-first calendar date used in user-facing messages (`dd/mm/yyyy`).
    pub fn format_date(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.format("%d/%m/%Y").to_string(),
            None => self.0.to_string(),
        }
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl From<DateTime<Utc>> for EpochMillis {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

/// Store-native timestamp object.
///
/// Accepts both the public field names and the underscore-prefixed names the
/// store uses when a timestamp is serialized without its client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimestamp {
    #[serde(alias = "_seconds")]
    pub seconds: i64,
    #[serde(default, alias = "_nanoseconds")]
    pub nanoseconds: i64,
}

impl StoreTimestamp {
    pub fn to_epoch_millis(&self) -> EpochMillis {
        EpochMillis(
            self.seconds
                .saturating_mul(1_000)
                .saturating_add(self.nanoseconds / 1_000_000),
        )
    }
}

/// A time value exactly as it was found in a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInstant {
    Millis(i64),
    FractionalMillis(f64),
    Text(String),
    Store(StoreTimestamp),
    Unrecognized(serde_json::Value),
}

impl RawInstant {
    /// Interprets the raw value, or `None` if it is not a recognizable instant.
    pub fn to_epoch_millis(&self) -> Option<EpochMillis> {
        match self {
            RawInstant::Millis(ms) => Some(EpochMillis(*ms)),
            RawInstant::FractionalMillis(ms) if ms.is_finite() => {
                Some(EpochMillis(ms.floor() as i64))
            }
            RawInstant::FractionalMillis(_) => None,
            RawInstant::Text(text) => parse_text(text),
            RawInstant::Store(ts) => Some(ts.to_epoch_millis()),
            RawInstant::Unrecognized(_) => None,
        }
    }

    /// Canonical instant, falling back to `now` for unparseable input.
    pub fn normalize(&self, now: EpochMillis) -> EpochMillis {
        match self.to_epoch_millis() {
            Some(ms) => ms,
            None => {
                tracing::debug!(raw = ?self, "unparseable stored instant, using now");
                now
            }
        }
    }

    /// Normalizes a nullable field. Absent stays absent.
    pub fn normalize_optional(raw: Option<&RawInstant>, now: EpochMillis) -> Option<EpochMillis> {
        raw.map(|r| r.normalize(now))
    }
}

impl From<EpochMillis> for RawInstant {
    fn from(ms: EpochMillis) -> Self {
        RawInstant::Millis(ms.as_millis())
    }
}

impl From<DateTime<Utc>> for RawInstant {
    fn from(dt: DateTime<Utc>) -> Self {
        RawInstant::Millis(dt.timestamp_millis())
    }
}

fn parse_text(text: &str) -> Option<EpochMillis> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(ms) = text.parse::<i64>() {
        return Some(EpochMillis(ms));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(EpochMillis(dt.timestamp_millis()));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(EpochMillis(naive.and_utc().timestamp_millis()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| EpochMillis(naive.and_utc().timestamp_millis()));
    }
    if let Ok(ms) = text.parse::<f64>() {
        if ms.is_finite() {
            return Some(EpochMillis(ms.floor() as i64));
        }
    }
    None
}
