//! The call registry: the process-wide table of in-progress calls.
//!
//! One table, one lock. Every mutation happens under the mutex so the
//! "unique code" and "first join wins" invariants hold no matter how
//! many connection tasks are running.

use crate::error::RegistryError;
use signal_types::CallCode;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Upper bound on code-generation retries per `create`.
const MAX_CODE_ATTEMPTS: usize = 32;

/// Opaque handle for a client connection.
///
/// The registry stores these as weak references: it never owns the
/// connection, and delivery goes through the relay's connection table,
/// so a stale id simply finds no target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

impl ConnId {
    /// Wrap a raw connection counter value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One in-progress call: the pairing record for a caller and, once
/// joined, a receiver.
#[derive(Debug, Clone)]
pub struct Call {
    /// The connection that created the call. Set at creation, immutable.
    pub caller: ConnId,
    /// The connection that joined. `None` until the first successful
    /// join; immutable once set.
    pub receiver: Option<ConnId>,
    /// Updated on creation, join, and every relayed message.
    last_activity: Instant,
}

/// Outcome of a join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The joiner took the receiver slot; `caller` should be notified.
    Joined {
        /// The connection that created the call.
        caller: ConnId,
    },
    /// The call already has a receiver. No state change.
    AlreadyPaired,
    /// No call has this code.
    NotFound,
}

/// Process-wide table of in-progress calls, keyed by call code.
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: Mutex<HashMap<CallCode, Call>>,
}

impl CallRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<CallCode, Call>> {
        // A poisoned lock means some other task panicked mid-access;
        // the table itself is still a plain map, so keep serving.
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mint a collision-free code and insert a new unpaired call owned
    /// by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CodeSpaceExhausted`] if every attempt
    /// collided with a live call.
    pub fn create(&self, caller: ConnId) -> Result<CallCode, RegistryError> {
        let mut table = self.table();
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = CallCode::generate();
            if table.contains_key(&code) {
                continue;
            }
            table.insert(
                code.clone(),
                Call {
                    caller,
                    receiver: None,
                    last_activity: Instant::now(),
                },
            );
            return Ok(code);
        }
        Err(RegistryError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Attempt to join the call with `code` as `receiver`.
    ///
    /// First join wins; later attempts on a paired call change nothing.
    pub fn join(&self, code: &CallCode, receiver: ConnId) -> JoinOutcome {
        let mut table = self.table();
        match table.get_mut(code) {
            None => JoinOutcome::NotFound,
            Some(call) if call.receiver.is_some() => JoinOutcome::AlreadyPaired,
            Some(call) => {
                call.receiver = Some(receiver);
                call.last_activity = Instant::now();
                JoinOutcome::Joined {
                    caller: call.caller,
                }
            }
        }
    }

    /// Snapshot the call with `code`, if it exists.
    pub fn lookup(&self, code: &CallCode) -> Option<Call> {
        self.table().get(code).cloned()
    }

    /// Record activity on a call (a relayed message).
    pub fn touch(&self, code: &CallCode) {
        if let Some(call) = self.table().get_mut(code) {
            call.last_activity = Instant::now();
        }
    }

    /// Delete the call with `code`. Idempotent.
    pub fn remove(&self, code: &CallCode) {
        self.table().remove(code);
    }

    /// Delete every call `conn` participates in, as caller or receiver.
    ///
    /// Called on connection close/error so codes are freed instead of
    /// leaking, and so a live peer cannot keep sending into a void.
    pub fn remove_participant(&self, conn: ConnId) -> Vec<CallCode> {
        let mut table = self.table();
        let codes: Vec<CallCode> = table
            .iter()
            .filter(|(_, call)| call.caller == conn || call.receiver == Some(conn))
            .map(|(code, _)| code.clone())
            .collect();
        for code in &codes {
            table.remove(code);
        }
        codes
    }

    /// Delete calls idle longer than `max_idle`. Returns the number removed.
    pub fn remove_idle(&self, max_idle: Duration) -> usize {
        let mut table = self.table();
        let before = table.len();
        table.retain(|_, call| call.last_activity.elapsed() < max_idle);
        before - table.len()
    }

    /// Number of live calls.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    /// Whether no calls are live.
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_codes_are_pairwise_distinct() {
        let registry = CallRegistry::new();
        let caller = ConnId::new(1);

        let mut codes = std::collections::HashSet::new();
        for _ in 0..200 {
            let code = registry.create(caller).unwrap();
            assert!(codes.insert(code), "registry returned a colliding code");
        }
        assert_eq!(registry.len(), 200);
    }

    #[test]
    fn create_sets_caller_and_no_receiver() {
        let registry = CallRegistry::new();
        let caller = ConnId::new(7);

        let code = registry.create(caller).unwrap();
        let call = registry.lookup(&code).unwrap();
        assert_eq!(call.caller, caller);
        assert_eq!(call.receiver, None);
    }

    #[test]
    fn first_join_wins() {
        let registry = CallRegistry::new();
        let caller = ConnId::new(1);
        let code = registry.create(caller).unwrap();

        let first = registry.join(&code, ConnId::new(2));
        assert_eq!(first, JoinOutcome::Joined { caller });

        // A later join is a no-op; the receiver slot is unchanged.
        let second = registry.join(&code, ConnId::new(3));
        assert_eq!(second, JoinOutcome::AlreadyPaired);
        assert_eq!(registry.lookup(&code).unwrap().receiver, Some(ConnId::new(2)));
    }

    #[test]
    fn join_unknown_code_is_not_found() {
        let registry = CallRegistry::new();
        let outcome = registry.join(&CallCode::from("ZZZZZ"), ConnId::new(2));
        assert_eq!(outcome, JoinOutcome::NotFound);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = CallRegistry::new();
        let code = registry.create(ConnId::new(1)).unwrap();

        registry.remove(&code);
        assert!(registry.lookup(&code).is_none());
        registry.remove(&code);
        assert!(registry.is_empty());
    }

    #[test]
    fn code_is_free_for_reuse_after_remove() {
        let registry = CallRegistry::new();
        let code = registry.create(ConnId::new(1)).unwrap();
        registry.remove(&code);

        // Simulate the generator landing on the same code again: a
        // fresh join must see a fresh call, not the old record.
        assert_eq!(
            registry.join(&code, ConnId::new(2)),
            JoinOutcome::NotFound
        );
    }

    #[test]
    fn remove_participant_drops_calls_on_both_sides() {
        let registry = CallRegistry::new();
        let caller = ConnId::new(1);
        let receiver = ConnId::new(2);

        // One call where conn 1 is the caller, one where it joined.
        let owned = registry.create(caller).unwrap();
        let joined = registry.create(ConnId::new(3)).unwrap();
        registry.join(&joined, caller);
        let unrelated = registry.create(receiver).unwrap();

        let removed = registry.remove_participant(caller);
        assert_eq!(removed.len(), 2);
        assert!(removed.contains(&owned));
        assert!(removed.contains(&joined));
        assert!(registry.lookup(&unrelated).is_some());
    }

    #[test]
    fn remove_participant_with_no_calls_is_a_noop() {
        let registry = CallRegistry::new();
        assert!(registry.remove_participant(ConnId::new(42)).is_empty());
    }

    #[test]
    fn idle_sweep_respects_threshold() {
        let registry = CallRegistry::new();
        registry.create(ConnId::new(1)).unwrap();
        registry.create(ConnId::new(2)).unwrap();

        // Nothing is an hour idle yet.
        assert_eq!(registry.remove_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 2);

        // A zero threshold treats everything as idle.
        assert_eq!(registry.remove_idle(Duration::ZERO), 2);
        assert!(registry.is_empty());
    }
}
