//! Organizer configuration

use std::path::PathBuf;
use std::time::Duration;

/// Tunables for the reminder organizer and its scan loop.
#[derive(Debug, Clone)]
pub struct OrganizerConfig {
    /// Directory holding one JSON file per owner.
    pub data_dir: PathBuf,
    /// How often the scan loop wakes to look for due reminders.
    pub tick: Duration,
    /// Per-owner reminder cap.
    pub max_reminders: usize,
    /// Failed delivery attempts tolerated before a reminder is dropped.
    /// A cap of N allows N + 1 attempts in total: the count is incremented
    /// after each failure and the reminder is dropped once count > cap.
    pub max_failed_deliveries: u32,
    /// Minimum spacing between a reminder and its first recurrence.
    pub min_interval: Duration,
    /// How long delete waits for a confirmation reply.
    pub confirm_timeout: Duration,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("remora")
                .join("reminders"),
            tick: Duration::from_secs(10),
            max_reminders: 200,
            max_failed_deliveries: 5,
            min_interval: Duration::from_secs(60 * 60),
            confirm_timeout: Duration::from_secs(10),
        }
    }
}
