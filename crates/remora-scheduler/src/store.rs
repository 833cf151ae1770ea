//! Per-owner reminder collections with synchronous durable writes
//!
//! Each owner's reminders live in one `Vec`, kept ascending by due time and
//! rewritten to `<owner_id>.json` as a whole after every mutation. The write
//! goes to a temp path first and is swapped in with an atomic rename, so an
//! interrupted write can never corrupt the previously persisted state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::warn;
use uuid::Uuid;

use remora_core::{Interval, Reminder, ReminderError, ReminderRecord};

pub struct ReminderStore {
    data_dir: PathBuf,
    max_reminders: usize,
    reminders: HashMap<u64, Vec<Reminder>>,
}

impl ReminderStore {
    /// Load every owner's file from `data_dir`, creating the directory if it
    /// does not exist. A missing or empty directory is an empty store, not
    /// an error; unreadable files and corrupt entries are skipped with a
    /// warning so one bad record cannot block startup.
    pub fn load(data_dir: PathBuf, max_reminders: usize) -> std::io::Result<Self> {
        fs::create_dir_all(&data_dir)?;
        let mut reminders: HashMap<u64, Vec<Reminder>> = HashMap::new();

        for entry in fs::read_dir(&data_dir)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    warn!("skipping unreadable directory entry: {err}");
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let owner: u64 = match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
            {
                Some(owner) => owner,
                None => {
                    warn!("skipping file with non-numeric owner id: {}", path.display());
                    continue;
                }
            };
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!("skipping unreadable owner file {}: {err}", path.display());
                    continue;
                }
            };
            let records: Vec<ReminderRecord> = match serde_json::from_str(&contents) {
                Ok(records) => records,
                Err(err) => {
                    warn!("skipping corrupt owner file {}: {err}", path.display());
                    continue;
                }
            };
            let mut owned: Vec<Reminder> = records
                .into_iter()
                .filter_map(|record| {
                    let reminder = record.into_reminder();
                    if reminder.is_none() {
                        warn!("skipping corrupt reminder record for owner {owner}");
                    }
                    reminder
                })
                .collect();
            owned.sort_by_key(|r| r.due_at);
            if !owned.is_empty() {
                reminders.insert(owner, owned);
            }
        }

        Ok(Self {
            data_dir,
            max_reminders,
            reminders,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// Number of reminders the owner currently holds.
    pub fn count(&self, owner: u64) -> usize {
        self.reminders.get(&owner).map_or(0, Vec::len)
    }

    /// Zero-based lookup into the owner's ascending-by-due-time sequence.
    pub fn get(&self, owner: u64, index: usize) -> Result<&Reminder, ReminderError> {
        let owned = self
            .reminders
            .get(&owner)
            .filter(|v| !v.is_empty())
            .ok_or(ReminderError::NoReminders)?;
        owned
            .get(index)
            .ok_or(ReminderError::IndexOutOfRange { count: owned.len() })
    }

    /// All of the owner's reminders in sort order.
    pub fn list(&self, owner: u64) -> Result<&[Reminder], ReminderError> {
        self.reminders
            .get(&owner)
            .filter(|v| !v.is_empty())
            .map(Vec::as_slice)
            .ok_or(ReminderError::NoReminders)
    }

    /// Current display index of a reminder, recomputed from sort order.
    pub fn index_of(&self, owner: u64, id: Uuid) -> Option<usize> {
        self.reminders
            .get(&owner)?
            .iter()
            .position(|r| r.id == id)
    }

    /// Insert a reminder, keeping the owner's sequence sorted, and persist.
    ///
    /// Rejected without mutation when the owner already holds the maximum
    /// number of reminders. Returns the reminder's display index.
    pub fn insert(&mut self, reminder: Reminder) -> Result<usize, ReminderError> {
        let owner = reminder.owner_id;
        if self.count(owner) >= self.max_reminders {
            return Err(ReminderError::TooManyReminders {
                cap: self.max_reminders,
            });
        }
        let owned = self.reminders.entry(owner).or_default();
        let id = reminder.id;
        owned.push(reminder);
        owned.sort_by_key(|r| r.due_at);
        self.persist(owner)?;
        // Just inserted, so the position exists
        Ok(self.index_of(owner, id).unwrap_or(0))
    }

    /// Remove a specific reminder by identity and persist. Identity-based so
    /// reminders with colliding due times cannot remove each other.
    pub fn remove(&mut self, owner: u64, id: Uuid) -> Result<Option<Reminder>, ReminderError> {
        let Some(owned) = self.reminders.get_mut(&owner) else {
            return Ok(None);
        };
        let Some(position) = owned.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let removed = owned.remove(position);
        self.persist(owner)?;
        if self.reminders.get(&owner).is_some_and(Vec::is_empty) {
            self.reminders.remove(&owner);
        }
        Ok(Some(removed))
    }

    /// Set or clear a reminder's interval in place and persist.
    /// Returns false when the reminder is no longer present.
    pub fn set_interval(
        &mut self,
        owner: u64,
        id: Uuid,
        interval: Option<Interval>,
    ) -> Result<bool, ReminderError> {
        let Some(reminder) = self
            .reminders
            .get_mut(&owner)
            .and_then(|owned| owned.iter_mut().find(|r| r.id == id))
        else {
            return Ok(false);
        };
        reminder.interval = interval;
        self.persist(owner)?;
        Ok(true)
    }

    /// Increment a reminder's failure count and persist.
    /// Returns the new count, or `None` when the reminder is gone.
    pub fn bump_failure(&mut self, owner: u64, id: Uuid) -> Result<Option<u32>, ReminderError> {
        let Some(reminder) = self
            .reminders
            .get_mut(&owner)
            .and_then(|owned| owned.iter_mut().find(|r| r.id == id))
        else {
            return Ok(None);
        };
        reminder.failure_count += 1;
        let count = reminder.failure_count;
        self.persist(owner)?;
        Ok(Some(count))
    }

    /// Snapshot every reminder due at or before `now`, ascending by due time
    /// within each owner. Owners are independent; cross-owner order is not
    /// significant.
    pub fn due(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<Reminder> {
        let mut due = Vec::new();
        for owned in self.reminders.values() {
            due.extend(owned.iter().filter(|r| r.due_at <= now).cloned());
        }
        due
    }

    /// Rewrite the owner's durable file: full replacement, written to a temp
    /// path and swapped in with an atomic rename.
    fn persist(&self, owner: u64) -> Result<(), ReminderError> {
        let records: Vec<ReminderRecord> = self
            .reminders
            .get(&owner)
            .map(|owned| owned.iter().map(ReminderRecord::from).collect())
            .unwrap_or_default();
        let json = serde_json::to_string_pretty(&records)
            .map_err(|err| ReminderError::Persistence {
                owner,
                source: std::io::Error::other(err),
            })?;

        let path = self.data_dir.join(format!("{owner}.json"));
        let tmp = self.data_dir.join(format!("{owner}.json.tmp"));
        let write = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &path));
        write.map_err(|source| ReminderError::Persistence { owner, source })
    }
}
