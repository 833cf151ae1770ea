//! remora-core - Shared types for the remora reminder bot
//!
//! This crate provides:
//! - The reminder data model and its durable record layout
//! - Time measure resolution and calendar-aware date arithmetic
//! - The error taxonomy shared by the store and organizer
//! - Message formatting and chunking helpers for embed delivery

pub mod config;
pub mod error;
pub mod format;
pub mod reminder;
pub mod time_measure;

pub use config::OrganizerConfig;
pub use error::{ReminderError, TimeError};
pub use format::{chunk_text, craft_message_link, EMBED_MAX_CHARACTERS};
pub use reminder::{Interval, Origin, Reminder, ReminderRecord};
pub use time_measure::TimeMeasure;
