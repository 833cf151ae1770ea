//! The reminder organizer: user-facing operations and the scan loop
//!
//! One organizer instance owns the store for the process lifetime. Command
//! handlers call the user-facing operations concurrently with the scan loop;
//! a single async mutex around the store serializes them (contention is
//! low), and every mutation persists the affected owner's file before the
//! lock is released.
//!
//! Failure policy for delivery: channel delivery falls back to a direct
//! message; when both fail the failure count is incremented and the reminder
//! retried next tick, until the count exceeds the configured cap. A dropped
//! reminder spawns no successor; the owner gets a best-effort DM about the
//! drop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use remora_channels::{ConfirmationWaiter, Notifier};
use remora_core::{Interval, Origin, OrganizerConfig, Reminder, ReminderError, TimeMeasure};

use crate::clock::{Clock, SystemClock};
use crate::store::ReminderStore;

/// How a delete confirmation round-trip ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Confirmed and removed.
    Deleted,
    /// The author replied with something other than yes; nothing changed.
    Declined,
    /// No reply within the timeout; nothing changed.
    TimedOut,
    /// The reminder fired or was removed while waiting for confirmation.
    AlreadyGone,
}

pub struct ReminderOrganizer {
    config: OrganizerConfig,
    store: Mutex<ReminderStore>,
    notifier: Arc<dyn Notifier>,
    waiter: Arc<dyn ConfirmationWaiter>,
    clock: Arc<dyn Clock>,
    started: AtomicBool,
}

impl ReminderOrganizer {
    pub fn new(
        config: OrganizerConfig,
        store: ReminderStore,
        notifier: Arc<dyn Notifier>,
        waiter: Arc<dyn ConfirmationWaiter>,
    ) -> Self {
        Self::with_clock(config, store, notifier, waiter, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: OrganizerConfig,
        store: ReminderStore,
        notifier: Arc<dyn Notifier>,
        waiter: Arc<dyn ConfirmationWaiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store: Mutex::new(store),
            notifier,
            waiter,
            clock,
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the background scan loop. Idempotent: a second call while the
    /// loop is running is a no-op and returns false. The loop runs until
    /// process exit.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("scan loop already running, ignoring duplicate start");
            return false;
        }
        let organizer = Arc::clone(self);
        tokio::spawn(async move {
            info!(tick = ?organizer.config.tick, "reminder scan loop started");
            loop {
                organizer.run_tick().await;
                tokio::time::sleep(organizer.config.tick).await;
            }
        });
        true
    }

    /// One scan pass: snapshot due reminders, deliver each, apply outcomes.
    ///
    /// The lock is not held across delivery awaits; outcomes are applied by
    /// identity afterwards, so a reminder deleted mid-flight is simply
    /// skipped. Failures are isolated per reminder.
    pub async fn run_tick(&self) {
        let now = self.clock.now();
        let due = {
            let store = self.store.lock().await;
            if store.is_empty() {
                return;
            }
            store.due(now)
        };
        for reminder in due {
            self.process_due(reminder, now).await;
        }
    }

    async fn process_due(&self, reminder: Reminder, now: DateTime<Utc>) {
        let owner = reminder.owner_id;
        let body = reminder.notification_text();

        let delivered = match self
            .notifier
            .deliver(
                reminder.origin.channel_id,
                "Reminder",
                &body,
                &reminder.owner_mention(),
            )
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    owner,
                    channel = reminder.origin.channel_id,
                    "channel delivery failed, falling back to DM: {err}"
                );
                match self.notifier.deliver_direct(owner, "Reminder", &body).await {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(owner, "direct delivery failed too: {err}");
                        false
                    }
                }
            }
        };

        if delivered {
            self.finish_delivered(&reminder, now).await;
        } else {
            self.record_failure(&reminder).await;
        }
    }

    /// Remove a delivered reminder and, for recurring ones, insert the
    /// successor due one interval after this firing's due time.
    async fn finish_delivered(&self, reminder: &Reminder, now: DateTime<Utc>) {
        let mut store = self.store.lock().await;
        match store.remove(reminder.owner_id, reminder.id) {
            Ok(Some(_)) => {}
            Ok(None) => return, // deleted while we were delivering
            Err(err) => {
                error!(owner = reminder.owner_id, "failed to persist removal: {err}");
            }
        }
        let Some(interval) = reminder.interval else {
            return;
        };
        // A previously validated interval should always resolve; if the
        // arithmetic overflows anyway, drop the recurrence instead of
        // crashing the loop.
        let successor_due = match interval.measure.add(reminder.due_at, interval.amount) {
            Ok(due) => due,
            Err(err) => {
                warn!(
                    owner = reminder.owner_id,
                    "dropping recurrence, could not compute next due time: {err}"
                );
                return;
            }
        };
        let successor = reminder.successor(successor_due, now);
        if let Err(err) = store.insert(successor) {
            warn!(owner = reminder.owner_id, "dropping recurrence: {err}");
        }
    }

    /// Count a fully failed delivery attempt; drop the reminder once the
    /// count exceeds the cap. A dropped reminder spawns no successor.
    async fn record_failure(&self, reminder: &Reminder) {
        let dropped = {
            let mut store = self.store.lock().await;
            match store.bump_failure(reminder.owner_id, reminder.id) {
                Ok(Some(count)) if count > self.config.max_failed_deliveries => {
                    if let Err(err) = store.remove(reminder.owner_id, reminder.id) {
                        error!(owner = reminder.owner_id, "failed to persist drop: {err}");
                    }
                    info!(
                        owner = reminder.owner_id,
                        failures = count,
                        "dropping undeliverable reminder"
                    );
                    true
                }
                Ok(Some(count)) => {
                    debug!(
                        owner = reminder.owner_id,
                        failures = count,
                        "keeping reminder for retry next tick"
                    );
                    false
                }
                Ok(None) => false, // deleted while we were delivering
                Err(err) => {
                    error!(
                        owner = reminder.owner_id,
                        "failed to persist failure count: {err}"
                    );
                    false
                }
            }
        };
        if dropped {
            // Best effort: the owner has been unreachable, but tell them if
            // we can.
            let body = format!(
                "This reminder could not be delivered and has been dropped:\n{}",
                reminder.notification_text()
            );
            if let Err(err) = self
                .notifier
                .deliver_direct(reminder.owner_id, "Reminder dropped", &body)
                .await
            {
                debug!(owner = reminder.owner_id, "drop notice undeliverable: {err}");
            }
        }
    }

    /// Create a reminder due at an absolute time. Returns its display index.
    pub async fn create(
        &self,
        owner_id: u64,
        origin: Origin,
        due_at: DateTime<Utc>,
        raw_message: String,
        command_text: String,
        note_text: String,
        announce: bool,
    ) -> Result<usize, ReminderError> {
        let reminder = Reminder::new(
            owner_id,
            origin,
            due_at,
            self.clock.now(),
            raw_message,
            command_text,
            note_text,
        );
        let (index, line) = {
            let mut store = self.store.lock().await;
            let index = store.insert(reminder.clone())?;
            (index, reminder.display_line(index))
        };
        if announce {
            self.announce(origin.channel_id, "Reminder added", &line, owner_id)
                .await;
        }
        Ok(index)
    }

    /// Create a reminder due a relative offset from now, e.g. "10 mins".
    pub async fn create_in(
        &self,
        owner_id: u64,
        origin: Origin,
        amount: u32,
        measure_token: &str,
        raw_message: String,
        command_text: String,
        note_text: String,
        announce: bool,
    ) -> Result<usize, ReminderError> {
        let measure = TimeMeasure::resolve(measure_token)?;
        let due_at = measure.add(self.clock.now(), amount)?;
        self.create(
            owner_id,
            origin,
            due_at,
            raw_message,
            command_text,
            note_text,
            announce,
        )
        .await
    }

    /// One display line per reminder, in current sort order.
    pub async fn list(&self, owner_id: u64) -> Result<Vec<String>, ReminderError> {
        let store = self.store.lock().await;
        Ok(store
            .list(owner_id)?
            .iter()
            .enumerate()
            .map(|(index, reminder)| reminder.display_line(index))
            .collect())
    }

    /// Number of reminders the owner currently holds.
    pub async fn count(&self, owner_id: u64) -> usize {
        self.store.lock().await.count(owner_id)
    }

    /// Delete by index, after a confirmation round-trip in `channel_id`.
    ///
    /// The store is untouched until a yes-reply arrives; a timeout or any
    /// other reply abandons the operation with no mutation visible.
    pub async fn delete(
        &self,
        owner_id: u64,
        channel_id: u64,
        index: usize,
    ) -> Result<DeleteOutcome, ReminderError> {
        let (id, line) = {
            let store = self.store.lock().await;
            let reminder = store.get(owner_id, index)?;
            (reminder.id, reminder.display_line(index))
        };
        self.announce(channel_id, "Confirm deletion of (y/n)", &line, owner_id)
            .await;

        let reply = self
            .waiter
            .await_reply(owner_id, channel_id, self.config.confirm_timeout)
            .await;
        let Some(reply) = reply else {
            self.announce(channel_id, "Deletion cancelled", "Sorry, you took too long.", owner_id)
                .await;
            return Ok(DeleteOutcome::TimedOut);
        };
        if !reply.trim().to_lowercase().starts_with('y') {
            return Ok(DeleteOutcome::Declined);
        }

        let removed = {
            let mut store = self.store.lock().await;
            store.remove(owner_id, id)?
        };
        match removed {
            Some(_) => {
                self.announce(channel_id, "Deleted", &line, owner_id).await;
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::AlreadyGone),
        }
    }

    /// Attach a recurrence interval to the reminder at `index`.
    ///
    /// The spacing between the reminder's due time and its first recurrence
    /// must be at least the configured minimum, so a typo can't set up a
    /// sub-minute recurrence storm.
    pub async fn add_interval(
        &self,
        owner_id: u64,
        index: usize,
        amount: u32,
        measure_token: &str,
    ) -> Result<usize, ReminderError> {
        let measure = TimeMeasure::resolve(measure_token)?;
        let mut store = self.store.lock().await;
        let reminder = store.get(owner_id, index)?;
        let first_recurrence = measure.add(reminder.due_at, amount)?;
        let minimum = TimeDelta::from_std(self.config.min_interval)
            .unwrap_or_else(|_| TimeDelta::hours(1));
        if first_recurrence - reminder.due_at < minimum {
            return Err(ReminderError::IntervalTooShort {
                minimum_secs: self.config.min_interval.as_secs(),
            });
        }
        let id = reminder.id;
        store.set_interval(owner_id, id, Some(Interval { amount, measure }))?;
        Ok(index)
    }

    /// Clear the interval on the reminder at `index`.
    pub async fn remove_interval(
        &self,
        owner_id: u64,
        index: usize,
    ) -> Result<usize, ReminderError> {
        let mut store = self.store.lock().await;
        let reminder = store.get(owner_id, index)?;
        if reminder.interval.is_none() {
            return Err(ReminderError::NoIntervalSet);
        }
        let id = reminder.id;
        store.set_interval(owner_id, id, None)?;
        Ok(index)
    }

    /// Listing of accepted time measures, for the help command.
    pub fn time_measure_help(&self) -> String {
        TimeMeasure::help_text()
    }

    /// Best-effort embed to a channel; failures are logged, not surfaced.
    async fn announce(&self, channel_id: u64, title: &str, body: &str, owner_id: u64) {
        let mention = format!("<@{owner_id}>");
        if let Err(err) = self
            .notifier
            .deliver(channel_id, title, body, &mention)
            .await
        {
            warn!(channel = channel_id, "could not send '{title}': {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use remora_channels::DeliveryError;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicBool as StdAtomicBool;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct Delivery {
        target: u64,
        title: String,
        body: String,
    }

    #[derive(Default)]
    struct MockNotifier {
        fail_deliver: StdAtomicBool,
        fail_direct: StdAtomicBool,
        deliveries: StdMutex<Vec<Delivery>>,
        directs: StdMutex<Vec<Delivery>>,
    }

    impl MockNotifier {
        fn failing_channel() -> Self {
            let notifier = Self::default();
            notifier.fail_deliver.store(true, Ordering::SeqCst);
            notifier
        }

        fn failing_both() -> Self {
            let notifier = Self::failing_channel();
            notifier.fail_direct.store(true, Ordering::SeqCst);
            notifier
        }

        fn deliveries_titled(&self, title: &str) -> Vec<Delivery> {
            self.deliveries
                .lock()
                .unwrap()
                .iter()
                .filter(|d| d.title == title)
                .cloned()
                .collect()
        }

        fn directs_titled(&self, title: &str) -> Vec<Delivery> {
            self.directs
                .lock()
                .unwrap()
                .iter()
                .filter(|d| d.title == title)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn deliver(
            &self,
            channel_id: u64,
            title: &str,
            body: &str,
            _mention: &str,
        ) -> Result<(), DeliveryError> {
            self.deliveries.lock().unwrap().push(Delivery {
                target: channel_id,
                title: title.to_string(),
                body: body.to_string(),
            });
            if self.fail_deliver.load(Ordering::SeqCst) {
                return Err(DeliveryError::Unreachable("forbidden".to_string()));
            }
            Ok(())
        }

        async fn deliver_direct(
            &self,
            user_id: u64,
            title: &str,
            body: &str,
        ) -> Result<(), DeliveryError> {
            self.directs.lock().unwrap().push(Delivery {
                target: user_id,
                title: title.to_string(),
                body: body.to_string(),
            });
            if self.fail_direct.load(Ordering::SeqCst) {
                return Err(DeliveryError::Transport("user unreachable".to_string()));
            }
            Ok(())
        }
    }

    struct MockWaiter {
        reply: Option<String>,
    }

    #[async_trait]
    impl ConfirmationWaiter for MockWaiter {
        async fn await_reply(
            &self,
            _author_id: u64,
            _channel_id: u64,
            _timeout: Duration,
        ) -> Option<String> {
            self.reply.clone()
        }
    }

    struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: StdMutex::new(Utc::now()),
            }
        }

        fn advance(&self, delta: ChronoDuration) {
            let mut now = self.now.lock().unwrap();
            *now += delta;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    struct Harness {
        organizer: Arc<ReminderOrganizer>,
        notifier: Arc<MockNotifier>,
        clock: Arc<ManualClock>,
        dir: tempfile::TempDir,
    }

    fn harness_with(notifier: MockNotifier, reply: Option<&str>, config: OrganizerConfig) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = OrganizerConfig {
            data_dir: dir.path().to_path_buf(),
            ..config
        };
        let store = ReminderStore::load(config.data_dir.clone(), config.max_reminders).unwrap();
        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::new());
        let waiter = Arc::new(MockWaiter {
            reply: reply.map(String::from),
        });
        let organizer = Arc::new(ReminderOrganizer::with_clock(
            config,
            store,
            notifier.clone(),
            waiter,
            clock.clone(),
        ));
        Harness {
            organizer,
            notifier,
            clock,
            dir,
        }
    }

    fn harness() -> Harness {
        harness_with(MockNotifier::default(), Some("yes"), OrganizerConfig::default())
    }

    fn origin() -> Origin {
        Origin {
            server_id: 10,
            channel_id: 20,
            message_id: 30,
        }
    }

    async fn create_due_in(h: &Harness, owner: u64, offset: ChronoDuration) -> usize {
        h.organizer
            .create(
                owner,
                origin(),
                h.clock.now() + offset,
                "!remindme test".to_string(),
                "!remindme".to_string(),
                "test note".to_string(),
                false,
            )
            .await
            .unwrap()
    }

    fn reload_count(h: &Harness, owner: u64) -> usize {
        ReminderStore::load(h.dir.path().to_path_buf(), 200)
            .unwrap()
            .count(owner)
    }

    #[tokio::test]
    async fn test_due_reminder_delivered_once_and_removed() {
        let h = harness();
        create_due_in(&h, 1, ChronoDuration::seconds(5)).await;

        // Not yet due
        h.organizer.run_tick().await;
        assert!(h.notifier.deliveries_titled("Reminder").is_empty());

        h.clock.advance(ChronoDuration::seconds(10));
        h.organizer.run_tick().await;

        let delivered = h.notifier.deliveries_titled("Reminder");
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].target, origin().channel_id);
        assert!(delivered[0].body.contains("test note"));
        assert_eq!(h.organizer.count(1).await, 0);
        assert_eq!(reload_count(&h, 1), 0);

        // Nothing left to deliver on later ticks
        h.organizer.run_tick().await;
        assert_eq!(h.notifier.deliveries_titled("Reminder").len(), 1);
    }

    #[tokio::test]
    async fn test_create_beyond_cap_fails_without_mutation() {
        let h = harness_with(MockNotifier::default(), None, OrganizerConfig::default());

        for i in 0..200i64 {
            create_due_in(&h, 1, ChronoDuration::minutes(i + 1)).await;
        }
        let err = h
            .organizer
            .create(
                1,
                origin(),
                h.clock.now() + ChronoDuration::days(1),
                "!remindme".to_string(),
                "!remindme".to_string(),
                "one too many".to_string(),
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::TooManyReminders { cap: 200 }));
        assert_eq!(h.organizer.count(1).await, 200);
    }

    #[tokio::test]
    async fn test_add_interval_below_minimum_is_rejected() {
        let h = harness();
        create_due_in(&h, 1, ChronoDuration::minutes(2)).await;

        let err = h
            .organizer
            .add_interval(1, 0, 1, "minutes")
            .await
            .unwrap_err();
        assert!(matches!(err, ReminderError::IntervalTooShort { .. }));

        // Interval remains unset, so removing it reports there is none
        let err = h.organizer.remove_interval(1, 0).await.unwrap_err();
        assert!(matches!(err, ReminderError::NoIntervalSet));
    }

    #[tokio::test]
    async fn test_add_interval_unknown_measure() {
        let h = harness();
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;
        let err = h
            .organizer
            .add_interval(1, 0, 1, "fortnights")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReminderError::Time(remora_core::TimeError::UnknownMeasure(_))
        ));
    }

    #[tokio::test]
    async fn test_add_and_remove_interval_persist() {
        let h = harness();
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;

        assert_eq!(h.organizer.add_interval(1, 0, 2, "hours").await.unwrap(), 0);
        let reloaded = ReminderStore::load(h.dir.path().to_path_buf(), 200).unwrap();
        assert_eq!(
            reloaded.get(1, 0).unwrap().interval,
            Some(Interval {
                amount: 2,
                measure: TimeMeasure::Hours
            })
        );

        assert_eq!(h.organizer.remove_interval(1, 0).await.unwrap(), 0);
        let reloaded = ReminderStore::load(h.dir.path().to_path_buf(), 200).unwrap();
        assert_eq!(reloaded.get(1, 0).unwrap().interval, None);
    }

    #[tokio::test]
    async fn test_recurrence_spawns_exactly_one_successor() {
        let h = harness();
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;
        h.organizer.add_interval(1, 0, 1, "hours").await.unwrap();

        let due_at = {
            let store = h.organizer.store.lock().await;
            let reminder = store.get(1, 0).unwrap();
            assert_eq!(reminder.failure_count, 0);
            reminder.due_at
        };

        h.clock.advance(ChronoDuration::hours(1) + ChronoDuration::seconds(1));
        h.organizer.run_tick().await;

        assert_eq!(h.notifier.deliveries_titled("Reminder").len(), 1);
        let store = h.organizer.store.lock().await;
        assert_eq!(store.count(1), 1);
        let successor = store.get(1, 0).unwrap();
        assert_eq!(successor.due_at, due_at + ChronoDuration::hours(1));
        assert_eq!(successor.failure_count, 0);
        assert_eq!(
            successor.interval,
            Some(Interval {
                amount: 1,
                measure: TimeMeasure::Hours
            })
        );
    }

    #[tokio::test]
    async fn test_fallback_delivery_counts_as_delivered() {
        let h = harness_with(
            MockNotifier::failing_channel(),
            None,
            OrganizerConfig::default(),
        );
        create_due_in(&h, 1, ChronoDuration::seconds(1)).await;
        h.clock.advance(ChronoDuration::seconds(5));
        h.organizer.run_tick().await;

        assert_eq!(h.notifier.deliveries_titled("Reminder").len(), 1);
        assert_eq!(h.notifier.directs_titled("Reminder").len(), 1);
        assert_eq!(h.organizer.count(1).await, 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_accumulates_then_drops() {
        let config = OrganizerConfig {
            max_failed_deliveries: 2,
            ..OrganizerConfig::default()
        };
        let h = harness_with(MockNotifier::failing_both(), None, config);

        create_due_in(&h, 1, ChronoDuration::seconds(1)).await;
        h.clock.advance(ChronoDuration::seconds(5));

        // Ticks one and two: failure count 1 then 2, reminder retained
        for expected in 1..=2u32 {
            h.organizer.run_tick().await;
            let store = h.organizer.store.lock().await;
            assert_eq!(store.get(1, 0).unwrap().failure_count, expected);
        }

        // Third tick pushes the count past the cap: removed, no successor,
        // drop notice attempted by DM
        h.organizer.run_tick().await;
        assert_eq!(h.organizer.count(1).await, 0);
        assert_eq!(reload_count(&h, 1), 0);
        assert_eq!(h.notifier.directs_titled("Reminder dropped").len(), 1);
        assert_eq!(h.notifier.deliveries_titled("Reminder").len(), 3);
    }

    #[tokio::test]
    async fn test_undeliverable_recurring_reminder_spawns_no_successor() {
        let config = OrganizerConfig {
            max_failed_deliveries: 0,
            ..OrganizerConfig::default()
        };
        let h = harness_with(MockNotifier::failing_both(), None, config);

        create_due_in(&h, 1, ChronoDuration::hours(1)).await;
        h.organizer.add_interval(1, 0, 1, "hours").await.unwrap();
        h.clock.advance(ChronoDuration::hours(2));
        h.organizer.run_tick().await;

        assert_eq!(h.organizer.count(1).await, 0);
    }

    #[tokio::test]
    async fn test_one_bad_reminder_does_not_block_others() {
        // Channel 20 (owner 1) fails both paths; owner 2 must still be served
        let h = harness_with(MockNotifier::failing_both(), None, OrganizerConfig::default());
        create_due_in(&h, 1, ChronoDuration::seconds(1)).await;
        create_due_in(&h, 2, ChronoDuration::seconds(1)).await;
        h.clock.advance(ChronoDuration::seconds(5));

        h.organizer.run_tick().await;
        // Both reminders were attempted this tick
        assert_eq!(h.notifier.deliveries_titled("Reminder").len(), 2);
    }

    #[tokio::test]
    async fn test_delete_confirmed() {
        let h = harness_with(MockNotifier::default(), Some("yes"), OrganizerConfig::default());
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;

        let outcome = h.organizer.delete(1, 20, 0).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(h.organizer.count(1).await, 0);
        assert_eq!(reload_count(&h, 1), 0);
        assert_eq!(h.notifier.deliveries_titled("Deleted").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_single_letter_confirmation() {
        let h = harness_with(MockNotifier::default(), Some("Y"), OrganizerConfig::default());
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;
        assert_eq!(h.organizer.delete(1, 20, 0).await.unwrap(), DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_delete_declined_leaves_store_untouched() {
        let h = harness_with(MockNotifier::default(), Some("no"), OrganizerConfig::default());
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;

        let outcome = h.organizer.delete(1, 20, 0).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(h.organizer.count(1).await, 1);
    }

    #[tokio::test]
    async fn test_delete_timeout_leaves_store_untouched() {
        let h = harness_with(MockNotifier::default(), None, OrganizerConfig::default());
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;

        let outcome = h.organizer.delete(1, 20, 0).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::TimedOut);
        assert_eq!(h.organizer.count(1).await, 1);
        assert_eq!(h.notifier.deliveries_titled("Deletion cancelled").len(), 1);
    }

    #[tokio::test]
    async fn test_delete_bad_index() {
        let h = harness();
        assert!(matches!(
            h.organizer.delete(1, 20, 0).await.unwrap_err(),
            ReminderError::NoReminders
        ));
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;
        assert!(matches!(
            h.organizer.delete(1, 20, 7).await.unwrap_err(),
            ReminderError::IndexOutOfRange { count: 1 }
        ));
    }

    #[tokio::test]
    async fn test_list_is_indexed_in_sort_order() {
        let h = harness();
        create_due_in(&h, 1, ChronoDuration::hours(5)).await;
        create_due_in(&h, 1, ChronoDuration::hours(1)).await;

        let lines = h.organizer.list(1).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0 : "));
        assert!(lines[1].starts_with("1 : "));

        assert!(matches!(
            h.organizer.list(99).await.unwrap_err(),
            ReminderError::NoReminders
        ));
    }

    #[tokio::test]
    async fn test_create_announces_with_index() {
        let h = harness();
        h.organizer
            .create(
                1,
                origin(),
                h.clock.now() + ChronoDuration::hours(1),
                "!remindme 1 hour stretch".to_string(),
                "!remindme 1 hour".to_string(),
                "stretch".to_string(),
                true,
            )
            .await
            .unwrap();

        let added = h.notifier.deliveries_titled("Reminder added");
        assert_eq!(added.len(), 1);
        assert!(added[0].body.starts_with("0 : "));
        assert!(added[0].body.contains("stretch"));
    }

    #[tokio::test]
    async fn test_create_in_resolves_measure() {
        let h = harness();
        let index = h
            .organizer
            .create_in(
                1,
                origin(),
                10,
                "mins",
                "!remindme 10 mins tea".to_string(),
                "!remindme 10 mins".to_string(),
                "tea".to_string(),
                false,
            )
            .await
            .unwrap();
        assert_eq!(index, 0);

        let store = h.organizer.store.lock().await;
        let reminder = store.get(1, 0).unwrap();
        assert_eq!(reminder.due_at, h.clock.now() + ChronoDuration::minutes(10));
    }

    #[tokio::test]
    async fn test_create_in_rejects_unknown_measure() {
        let h = harness();
        let err = h
            .organizer
            .create_in(
                1,
                origin(),
                10,
                "moons",
                String::new(),
                String::new(),
                String::new(),
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReminderError::Time(remora_core::TimeError::UnknownMeasure(_))
        ));
        assert_eq!(h.organizer.count(1).await, 0);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let config = OrganizerConfig {
            tick: Duration::from_millis(50),
            ..OrganizerConfig::default()
        };
        let h = harness_with(MockNotifier::default(), None, config);
        create_due_in(&h, 1, ChronoDuration::seconds(0)).await;
        h.clock.advance(ChronoDuration::seconds(1));

        assert!(h.organizer.start());
        assert!(!h.organizer.start());

        // Let several ticks elapse; one loop means one delivery in total
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(h.notifier.deliveries_titled("Reminder").len(), 1);
    }
}
