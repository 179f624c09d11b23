//! Per-user cooldown ledger.
//! Each user owns a list of `(key, expires_at, duration)` entries. Reading a user's list drops the
//! expired entries first, so the ledger compacts itself on access and never needs a sweeper.
use crate::dispatch::key::CommandKey;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoolDownEntry {
    /// Full command key, including group and subcommand segments.
    pub key: CommandKey,
    pub expires_at: DateTime<Utc>,
    /// The cooldown amount in seconds.
    pub duration: u32,
}

#[derive(Debug, Default)]
pub struct CoolDownLedger {
    queue: HashMap<String, Vec<CoolDownEntry>>,
}

impl CoolDownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a cooldown ending `duration` seconds after `now`. Entries are never deduplicated;
    /// lookups take the first match.
    pub fn register(&mut self, user_id: &str, key: CommandKey, duration: u32, now: DateTime<Utc>) {
        let entry = CoolDownEntry {
            key,
            expires_at: now + Duration::seconds(i64::from(duration)),
            duration,
        };
        self.queue.entry(user_id.to_owned()).or_default().push(entry);
    }

    /// Returns the live cooldowns of a user, optionally restricted to keys under `prefix`.
    /// Expired entries are removed from the ledger as a side effect.
    pub fn values(
        &mut self,
        user_id: &str,
        prefix: Option<&CommandKey>,
        now: DateTime<Utc>,
    ) -> Vec<CoolDownEntry> {
        let Some(entries) = self.queue.get_mut(user_id) else {
            return Vec::new();
        };
        entries.retain(|entry| now < entry.expires_at);
        if entries.is_empty() {
            self.queue.remove(user_id);
            return Vec::new();
        }
        entries
            .iter()
            .filter(|entry| prefix.is_none_or(|p| entry.key.starts_with(p)))
            .cloned()
            .collect()
    }

    /// Number of users that currently hold at least one entry (expired or not).
    pub fn tracked_users(&self) -> usize {
        self.queue.len()
    }
}
