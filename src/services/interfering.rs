//! Per-user ledger of commands currently in flight.
//! Entries never expire: they live until [`InterferingLedger::remove`] is called for their key.
use crate::dispatch::key::CommandKey;
use std::collections::HashMap;

/// Identifies the invocation that owns an in-flight entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationHandle {
    pub interaction_id: String,
    /// Platform id of the published command, used to render slash mentions.
    pub command_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterferingEntry {
    pub key: CommandKey,
    pub handle: InvocationHandle,
}

impl InterferingEntry {
    /// Renders the entry as `</key:id>` when the platform command id is known, else `/key`.
    pub fn mention(&self) -> String {
        match &self.handle.command_id {
            Some(id) => format!("</{}:{}>", self.key, id),
            None => format!("/{}", self.key),
        }
    }
}

#[derive(Debug, Default)]
pub struct InterferingLedger {
    queue: HashMap<String, Vec<InterferingEntry>>,
}

impl InterferingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, user_id: &str, key: CommandKey, handle: InvocationHandle) {
        self.queue
            .entry(user_id.to_owned())
            .or_default()
            .push(InterferingEntry { key, handle });
    }

    /// Entries of a user whose key starts with any of `prefixes`; all entries when `prefixes` is empty.
    pub fn values(&self, user_id: &str, prefixes: &[CommandKey]) -> Vec<InterferingEntry> {
        let Some(entries) = self.queue.get(user_id) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|entry| prefixes.is_empty() || prefixes.iter().any(|p| entry.key.starts_with(p)))
            .cloned()
            .collect()
    }

    /// Removes every entry of the user whose key equals `key` exactly. Removing twice is a no-op.
    pub fn remove(&mut self, user_id: &str, key: &CommandKey) {
        let Some(entries) = self.queue.get_mut(user_id) else {
            return;
        };
        entries.retain(|entry| &entry.key != key);
        if entries.is_empty() {
            self.queue.remove(user_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: &str) -> InvocationHandle {
        InvocationHandle {
            interaction_id: id.to_owned(),
            command_id: None,
        }
    }

    #[test]
    fn remove_is_exact_and_idempotent() {
        let mut ledger = InterferingLedger::new();
        ledger.register("u1", CommandKey::parse("game"), handle("1"));
        ledger.register("u1", CommandKey::parse("game start"), handle("2"));

        ledger.remove("u1", &CommandKey::parse("game"));
        let left = ledger.values("u1", &[]);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].key.to_string(), "game start");

        ledger.remove("u1", &CommandKey::parse("game"));
        assert_eq!(ledger.values("u1", &[]).len(), 1);
    }

    #[test]
    fn any_prefix_matches() {
        let mut ledger = InterferingLedger::new();
        ledger.register("u1", CommandKey::parse("a x"), handle("1"));
        ledger.register("u1", CommandKey::parse("b"), handle("2"));
        ledger.register("u1", CommandKey::parse("bb"), handle("3"));
        let hits = ledger.values("u1", &[CommandKey::parse("a"), CommandKey::parse("b")]);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn mention_uses_platform_id_when_known() {
        let entry = InterferingEntry {
            key: CommandKey::parse("game start"),
            handle: InvocationHandle {
                interaction_id: "9".into(),
                command_id: Some("42".into()),
            },
        };
        assert_eq!(entry.mention(), "</game start:42>");
    }
}
