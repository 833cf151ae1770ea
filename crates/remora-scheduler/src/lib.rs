//! remora-scheduler - The reminder store and organizer
//!
//! This crate provides:
//! - [`ReminderStore`]: per-owner ordered reminder collections with
//!   synchronous durable writes (one JSON file per owner)
//! - [`ReminderOrganizer`]: the user-facing operations and the background
//!   scan loop that delivers due reminders, handles delivery failures and
//!   reschedules recurring ones

pub mod clock;
pub mod organizer;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use organizer::{DeleteOutcome, ReminderOrganizer};
pub use store::ReminderStore;
