//! Shared flow-control state: both ledgers behind one lock.
//!
//! The gate check and the registration that follows it happen under a single lock acquisition, so
//! two near-simultaneous invocations by the same user cannot both pass the interference gate. The
//! lock is a synchronous mutex and is never held across an `.await`; this lets
//! [`InterferenceSlot`] release its entry from `Drop`.
use crate::dispatch::key::CommandKey;
use crate::services::clock::{Clock, SystemClock};
use crate::services::cool_down::{CoolDownEntry, CoolDownLedger};
use crate::services::interfering::{InterferingEntry, InterferingLedger, InvocationHandle};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct Ledgers {
    cool_downs: CoolDownLedger,
    interfering: InterferingLedger,
}

/// Why a gate refused an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocked {
    /// A live cooldown exists; carries the earliest expiry.
    CoolingDown { expires_at: DateTime<Utc> },
    /// Conflicting commands are in flight for the same user.
    Interfering { colliding: Vec<InterferingEntry> },
}

/// What the gate needs to know about one invocation.
#[derive(Debug, Clone)]
pub struct GateRequest<'a> {
    pub user_id: &'a str,
    pub key: &'a CommandKey,
    pub interfering: &'a [CommandKey],
    pub cool_down: u32,
    pub handle: InvocationHandle,
}

pub struct FlowControl {
    ledgers: Mutex<Ledgers>,
    clock: Arc<dyn Clock>,
}

impl FlowControl {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            ledgers: Mutex::new(Ledgers::default()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, Ledgers> {
        self.ledgers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks the cooldown gate, then the interference gate, and on success registers the
    /// in-flight entry followed by the cooldown entry. Returns a slot that removes the in-flight
    /// entry when released or dropped.
    pub fn acquire(self: &Arc<Self>, request: GateRequest<'_>) -> Result<InterferenceSlot, Blocked> {
        let now = self.clock.now();
        let mut ledgers = self.lock();

        let cooling = ledgers
            .cool_downs
            .values(request.user_id, Some(request.key), now);
        if let Some(expires_at) = cooling.iter().map(|entry| entry.expires_at).min() {
            debug!(target: "flow", user_id = %request.user_id, command = %request.key, %expires_at, "blocked by cooldown");
            return Err(Blocked::CoolingDown { expires_at });
        }

        let mut prefixes = Vec::with_capacity(request.interfering.len() + 1);
        prefixes.push(request.key.clone());
        prefixes.extend(request.interfering.iter().cloned());
        let colliding = ledgers.interfering.values(request.user_id, &prefixes);
        if !colliding.is_empty() {
            debug!(target: "flow", user_id = %request.user_id, command = %request.key, count = colliding.len(), "blocked by interfering commands");
            return Err(Blocked::Interfering { colliding });
        }

        ledgers
            .interfering
            .register(request.user_id, request.key.clone(), request.handle);
        ledgers.cool_downs.register(
            request.user_id,
            request.key.clone(),
            request.cool_down,
            now,
        );
        debug!(target: "flow", user_id = %request.user_id, command = %request.key, cool_down = request.cool_down, "registered");

        Ok(InterferenceSlot {
            flow: Arc::clone(self),
            user_id: request.user_id.to_owned(),
            key: request.key.clone(),
            released: false,
        })
    }

    /// Live cooldowns of a user (compacts expired entries).
    pub fn cool_downs(&self, user_id: &str, prefix: Option<&CommandKey>) -> Vec<CoolDownEntry> {
        let now = self.clock.now();
        self.lock().cool_downs.values(user_id, prefix, now)
    }

    /// In-flight commands of a user matching any prefix (all when empty).
    pub fn interfering(&self, user_id: &str, prefixes: &[CommandKey]) -> Vec<InterferingEntry> {
        self.lock().interfering.values(user_id, prefixes)
    }

    /// Removes the in-flight entries for `key`. Prefer releasing an [`InterferenceSlot`].
    pub fn remove_interfering(&self, user_id: &str, key: &CommandKey) {
        self.lock().interfering.remove(user_id, key);
    }
}

impl Default for FlowControl {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// The in-flight registration of one invocation. Released exactly once: explicitly through
/// [`InterferenceSlot::release`] or implicitly on drop (including unwinding out of a handler).
pub struct InterferenceSlot {
    flow: Arc<FlowControl>,
    user_id: String,
    key: CommandKey,
    released: bool,
}

impl InterferenceSlot {
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.flow.remove_interfering(&self.user_id, &self.key);
        debug!(target: "flow", user_id = %self.user_id, command = %self.key, "released");
    }
}

impl Drop for InterferenceSlot {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for InterferenceSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterferenceSlot")
            .field("user_id", &self.user_id)
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}
