//! Per-pull-request mutual exclusion.
//!
//! The pipeline guarantees at most one in-flight analysis per
//! `(repository, pr_number)` key. Contenders are rejected immediately, not
//! queued: bounding worst-case latency matters more than fairness here, and
//! queuing would let repeated submissions build an unbounded backlog.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(test)]
#[path = "run_tokens_tests.rs"]
mod tests;

type RunKey = (String, u64);

/// Registry of in-flight analysis runs.
///
/// Cloning is cheap; clones share the same key set.
#[derive(Debug, Clone, Default)]
pub struct RunTokenRegistry {
    in_flight: Arc<Mutex<HashSet<RunKey>>>,
}

impl RunTokenRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire the run token for a pull request.
    ///
    /// Returns `None` while another token for the same key is live. The
    /// returned token releases the key when dropped, so every exit path of
    /// the holder — success, error, timeout, cancellation — releases it.
    pub fn try_acquire(&self, repository: &str, pr_number: u64) -> Option<RunToken> {
        let key = (repository.to_string(), pr_number);

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !in_flight.insert(key.clone()) {
            return None;
        }

        Some(RunToken {
            registry: Arc::clone(&self.in_flight),
            key,
        })
    }

    /// The number of analyses currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// An exclusive permit for analyzing one pull request.
///
/// The key is released on drop. A poisoned registry lock must still release
/// the key, otherwise a panicking run would block its pull request forever.
#[derive(Debug)]
pub struct RunToken {
    registry: Arc<Mutex<HashSet<RunKey>>>,
    key: RunKey,
}

impl Drop for RunToken {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
