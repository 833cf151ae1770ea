//! Reminder entity and its durable record layout
//!
//! A [`Reminder`] is the in-memory form the store and organizer work with.
//! [`ReminderRecord`] is the flat on-disk form, kept compatible with the
//! files earlier bot versions wrote: ids and timestamps are strings, the
//! timestamps string-encoded float seconds, and `failed_count` is omitted
//! when zero.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::craft_message_link;
use crate::time_measure::TimeMeasure;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Where a reminder was created and where its notification is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub server_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
}

/// Recurrence rule: fire again `amount` measures after each due time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub amount: u32,
    pub measure: TimeMeasure,
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.measure)
    }
}

/// A single scheduled notification.
#[derive(Debug, Clone)]
pub struct Reminder {
    /// Identity for removal; stable across restarts once persisted.
    pub id: Uuid,
    /// When the notification should fire.
    pub due_at: DateTime<Utc>,
    /// When the reminder was created (display only).
    pub created_at: DateTime<Utc>,
    /// The user who created the reminder.
    pub owner_id: u64,
    /// Delivery target and backlink context.
    pub origin: Origin,
    /// The full message the reminder was created from.
    pub raw_message: String,
    /// The command portion, e.g. "!remindme 2 hours".
    pub command_text: String,
    /// The note to redisplay when the reminder fires.
    pub note_text: String,
    /// Recurrence rule, if any.
    pub interval: Option<Interval>,
    /// Consecutive failed delivery attempts. Only increases; a recurrence
    /// successor starts over at zero.
    pub failure_count: u32,
}

impl Reminder {
    pub fn new(
        owner_id: u64,
        origin: Origin,
        due_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        raw_message: String,
        command_text: String,
        note_text: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            due_at,
            created_at,
            owner_id,
            origin,
            raw_message,
            command_text,
            note_text,
            interval: None,
            failure_count: 0,
        }
    }

    /// Build the recurrence successor fired at this reminder's due time.
    ///
    /// Same owner, origin and interval; fresh identity and a failure count
    /// of zero regardless of how many attempts the predecessor burned.
    pub fn successor(&self, due_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            due_at,
            created_at: now,
            owner_id: self.owner_id,
            origin: self.origin,
            raw_message: self.raw_message.clone(),
            command_text: self.command_text.clone(),
            note_text: self.note_text.clone(),
            interval: self.interval,
            failure_count: 0,
        }
    }

    /// Timestamps, interval, backlink and captured text, without an index.
    /// Used as the body of the delivery embed.
    pub fn notification_text(&self) -> String {
        let link = craft_message_link(
            self.origin.server_id,
            self.origin.channel_id,
            self.origin.message_id,
        );
        let interval = match &self.interval {
            Some(interval) => format!(" (Interval: {interval})"),
            None => String::new(),
        };
        format!(
            "{} -> {}{interval}\n{link}\n{}\n{}\n",
            self.created_at.format(DISPLAY_FORMAT),
            self.due_at.format(DISPLAY_FORMAT),
            self.command_text,
            self.note_text,
        )
    }

    /// One list line: the notification text prefixed with the current
    /// display index. Indices are recomputed from sort order every time,
    /// never stored.
    pub fn display_line(&self, index: usize) -> String {
        format!("{index} : {}", self.notification_text())
    }

    /// The `<@id>` mention string for the owner.
    pub fn owner_mention(&self) -> String {
        format!("<@{}>", self.owner_id)
    }
}

/// Flat durable form of a [`Reminder`], one array of these per owner file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderRecord {
    /// Identity; generated for records written before it was persisted.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Due time as string-encoded float seconds since the epoch.
    pub reminder_timestamp: String,
    /// Creation time, same encoding.
    pub now_timestamp: String,
    pub user_id: String,
    pub message_id: String,
    pub channel_id: String,
    pub server_id: String,
    pub raw_message: String,
    pub message_commands: String,
    pub message_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_amount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_measure: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failed_count: u32,
}

fn is_zero(count: &u32) -> bool {
    *count == 0
}

fn encode_timestamp(t: DateTime<Utc>) -> String {
    format!("{:.6}", t.timestamp_micros() as f64 / 1_000_000.0)
}

fn decode_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let seconds: f64 = s.parse().ok()?;
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round() as i64)
}

impl From<&Reminder> for ReminderRecord {
    fn from(reminder: &Reminder) -> Self {
        Self {
            id: reminder.id,
            reminder_timestamp: encode_timestamp(reminder.due_at),
            now_timestamp: encode_timestamp(reminder.created_at),
            user_id: reminder.owner_id.to_string(),
            message_id: reminder.origin.message_id.to_string(),
            channel_id: reminder.origin.channel_id.to_string(),
            server_id: reminder.origin.server_id.to_string(),
            raw_message: reminder.raw_message.clone(),
            message_commands: reminder.command_text.clone(),
            message_text: reminder.note_text.clone(),
            interval_amount: reminder.interval.map(|i| i.amount),
            interval_measure: reminder.interval.map(|i| i.measure.name().to_string()),
            failed_count: reminder.failure_count,
        }
    }
}

impl ReminderRecord {
    /// Rebuild the in-memory entity. Records with unparseable timestamps or
    /// ids are rejected so one corrupt entry can be skipped at load time
    /// instead of poisoning the whole owner file.
    pub fn into_reminder(self) -> Option<Reminder> {
        let due_at = decode_timestamp(&self.reminder_timestamp)?;
        let created_at = decode_timestamp(&self.now_timestamp)?;
        let interval = match (self.interval_amount, self.interval_measure.as_deref()) {
            (Some(amount), Some(token)) => Some(Interval {
                amount,
                measure: TimeMeasure::resolve(token).ok()?,
            }),
            _ => None,
        };
        Some(Reminder {
            id: self.id,
            due_at,
            created_at,
            owner_id: self.user_id.parse().ok()?,
            origin: Origin {
                server_id: self.server_id.parse().ok()?,
                channel_id: self.channel_id.parse().ok()?,
                message_id: self.message_id.parse().ok()?,
            },
            raw_message: self.raw_message,
            command_text: self.message_commands,
            note_text: self.message_text,
            interval,
            failure_count: self.failed_count,
        })
    }
}
