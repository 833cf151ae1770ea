//! Time measure resolution and calendar-aware date arithmetic
//!
//! Reminder offsets are written by users as free text ("10 mins", "2 weeks").
//! This module maps unit tokens to a canonical measure and computes target
//! timestamps with calendar arithmetic, so "1 month" from January 31st lands
//! on the last day of February instead of a fixed number of seconds later.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimeError;

/// A canonical unit of time a reminder offset or interval is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMeasure {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

/// Accepted spellings for each measure, matched case-sensitively.
const ALIASES: &[(TimeMeasure, &[&str])] = &[
    (TimeMeasure::Seconds, &["sec", "secs", "second", "seconds"]),
    (TimeMeasure::Minutes, &["min", "mins", "minute", "minutes"]),
    (TimeMeasure::Hours, &["hour", "hours"]),
    (TimeMeasure::Days, &["day", "days"]),
    (TimeMeasure::Weeks, &["week", "weeks"]),
    (TimeMeasure::Months, &["month", "months"]),
    (TimeMeasure::Years, &["year", "years"]),
];

impl TimeMeasure {
    /// Resolve a free-text unit token to a canonical measure.
    ///
    /// Matching is a case-sensitive exact match against the alias table.
    /// Unknown tokens are a validation error for the caller to surface,
    /// never a crash.
    pub fn resolve(token: &str) -> Result<Self, TimeError> {
        ALIASES
            .iter()
            .find(|(_, aliases)| aliases.contains(&token))
            .map(|(measure, _)| *measure)
            .ok_or_else(|| TimeError::UnknownMeasure(token.to_string()))
    }

    /// Add `amount` of this measure to `base`.
    ///
    /// Months and years use calendar arithmetic (day-of-month clamped to the
    /// target month); the fixed-length measures add an exact duration. An
    /// out-of-range result is reported as [`TimeError::Overflow`].
    pub fn add(self, base: DateTime<Utc>, amount: u32) -> Result<DateTime<Utc>, TimeError> {
        let result = match self {
            Self::Seconds => base.checked_add_signed(Duration::seconds(i64::from(amount))),
            Self::Minutes => base.checked_add_signed(Duration::minutes(i64::from(amount))),
            Self::Hours => base.checked_add_signed(Duration::hours(i64::from(amount))),
            Self::Days => base.checked_add_signed(Duration::days(i64::from(amount))),
            Self::Weeks => base.checked_add_signed(Duration::weeks(i64::from(amount))),
            Self::Months => base.checked_add_months(Months::new(amount)),
            Self::Years => amount
                .checked_mul(12)
                .and_then(|months| base.checked_add_months(Months::new(months))),
        };
        result.ok_or(TimeError::Overflow)
    }

    /// Canonical name, as stored in durable records.
    pub fn name(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }

    /// All measures in ascending order of magnitude.
    pub fn all() -> &'static [TimeMeasure] {
        &[
            Self::Seconds,
            Self::Minutes,
            Self::Hours,
            Self::Days,
            Self::Weeks,
            Self::Months,
            Self::Years,
        ]
    }

    /// Human-readable listing of every measure and its accepted spellings,
    /// used by the time-measure help command.
    pub fn help_text() -> String {
        let mut out = String::from("Available time measures:\n");
        for (measure, aliases) in ALIASES {
            out.push_str(&format!("{}: {}\n", measure.name(), aliases.join(", ")));
        }
        out
    }
}

impl std::fmt::Display for TimeMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
