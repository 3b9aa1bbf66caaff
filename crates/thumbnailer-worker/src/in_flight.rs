//! Serializes processing of messages that share an identifier

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

type Locks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Identifiers currently being processed.
///
/// A redelivered message waits for the run already holding its identifier,
/// so two runs never share a scratch copy.
#[derive(Default)]
pub struct InFlight {
    locks: Locks,
}

/// Held for the whole run of one message
pub struct InFlightClaim<'a> {
    locks: &'a Locks,
    id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn claim(&self, id: &str) -> InFlightClaim<'_> {
        let lock = lock_map(&self.locks)
            .entry(id.to_string())
            .or_default()
            .clone();

        if lock.try_lock().is_err() {
            tracing::info!(message_id = %id, "Same message already in flight, waiting");
        }
        let guard = lock.lock_owned().await;

        InFlightClaim {
            locks: &self.locks,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = lock_map(self.locks);
        // Waiters hold a clone; the entry goes once nobody does.
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

fn lock_map(locks: &Locks) -> std::sync::MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
