//! Error taxonomy shared by the store and organizer
//!
//! Validation failures are typed so command handlers can turn each one into
//! a concise user-facing message. Only persistence failures carry an
//! underlying source error.

use thiserror::Error;

/// Errors from time measure resolution and date arithmetic.
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("unknown time measure '{0}'")]
    UnknownMeasure(String),

    #[error("resulting date is out of range")]
    Overflow,
}

/// Errors from reminder store and organizer operations.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// The owner has no reminders at all.
    #[error("you don't have any reminders")]
    NoReminders,

    /// The owner has reminders, but not at the requested index.
    #[error("you don't have that many reminders (you have {count})")]
    IndexOutOfRange { count: usize },

    /// The owner is at the per-user reminder cap.
    #[error("there are already too many reminders (maximum {cap})")]
    TooManyReminders { cap: usize },

    /// A recurrence interval would fire sooner than the configured minimum.
    #[error("interval is too short (minimum {minimum_secs} seconds)")]
    IntervalTooShort { minimum_secs: u64 },

    /// `remove_interval` on a reminder that has no interval.
    #[error("that reminder has no interval set")]
    NoIntervalSet,

    #[error(transparent)]
    Time(#[from] TimeError),

    /// Writing an owner's durable file failed. The in-memory state may be
    /// ahead of disk; the mutation should be retried.
    #[error("failed to persist reminders for owner {owner}")]
    Persistence {
        owner: u64,
        #[source]
        source: std::io::Error,
    },
}

impl ReminderError {
    /// Whether this error should be shown to the user as-is (validation)
    /// rather than logged for operators (persistence).
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Persistence { .. })
    }
}
