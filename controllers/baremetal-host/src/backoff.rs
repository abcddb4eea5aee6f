//! # Fibonacci Backoff
//!
//! Progressive requeue delays for hosts whose prerequisites keep failing to
//! resolve. Grows more slowly than exponential backoff.
//!
//! The sequence is calculated in minutes: 1m, 1m, 2m, 3m, 5m, 8m, 10m (max),
//! then converted to seconds for use in the reconciler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, capped at `max_minutes`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Previous backoff value in minutes
    prev_minutes: u64,
    /// Current backoff value in minutes
    current_minutes: u64,
    /// Maximum backoff value in minutes
    max_minutes: u64,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff with specified minimum and maximum values in minutes
    ///
    /// # Arguments
    ///
    /// * `min_minutes` - Minimum backoff duration in minutes (used for first two values, typically 1)
    /// * `max_minutes` - Maximum backoff duration in minutes (caps the sequence, typically 10)
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes: max_minutes.max(min_minutes),
        }
    }

    /// Get the next backoff duration in seconds and advance the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result_seconds = self.current_minutes * 60;

        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = std::cmp::min(next_minutes, self.max_minutes);

        result_seconds
    }
}

/// Backoff state for a host
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

/// Per-host backoff bookkeeping (`namespace/name` -> state)
#[derive(Debug, Clone)]
pub struct HostBackoffs {
    min_minutes: u64,
    max_minutes: u64,
    states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl HostBackoffs {
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            max_minutes,
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn new_state(&self) -> BackoffState {
        BackoffState {
            backoff: FibonacciBackoff::new(self.min_minutes, self.max_minutes),
            error_count: 0,
        }
    }

    /// Record a failed pass and return `(backoff_seconds, error_count)`
    pub fn record_failure(&self, key: &str) -> (u64, u32) {
        match self.states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(key.to_string())
                    .or_insert_with(|| self.new_state());
                state.error_count += 1;
                (state.backoff.next_backoff_seconds(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using default backoff", e);
                (self.min_minutes * 60, 0)
            }
        }
    }

    /// Forget the failures of a host
    ///
    /// The entry is dropped rather than rewound, so hosts that recover or
    /// disappear leave nothing behind.
    pub fn reset(&self, key: &str) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.states.lock().map(|states| states.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(1, 10);

        assert_eq!(backoff.next_backoff_seconds(), 60); // 1m
        assert_eq!(backoff.next_backoff_seconds(), 60); // 1m
        assert_eq!(backoff.next_backoff_seconds(), 120); // 2m
        assert_eq!(backoff.next_backoff_seconds(), 180); // 3m
        assert_eq!(backoff.next_backoff_seconds(), 300); // 5m
        assert_eq!(backoff.next_backoff_seconds(), 480); // 8m
        assert_eq!(backoff.next_backoff_seconds(), 600); // 10m (max)
        assert_eq!(backoff.next_backoff_seconds(), 600);
    }

    #[test]
    fn test_max_below_min_is_raised() {
        let mut backoff = FibonacciBackoff::new(5, 1);
        assert_eq!(backoff.next_backoff_seconds(), 300);
        assert_eq!(backoff.next_backoff_seconds(), 300);
    }

    #[test]
    fn test_host_backoffs_are_tracked_per_host() {
        let backoffs = HostBackoffs::new(1, 10);

        assert_eq!(backoffs.record_failure("ns/a"), (60, 1));
        assert_eq!(backoffs.record_failure("ns/a"), (60, 2));
        assert_eq!(backoffs.record_failure("ns/a"), (120, 3));
        assert_eq!(backoffs.record_failure("ns/b"), (60, 1), "other hosts start fresh");

        backoffs.reset("ns/a");
        assert_eq!(backoffs.record_failure("ns/a"), (60, 1));
        assert_eq!(backoffs.record_failure("ns/b"), (60, 2));
    }

    #[test]
    fn test_reset_drops_host_entry() {
        let backoffs = HostBackoffs::new(1, 10);
        backoffs.record_failure("ns/a");
        backoffs.record_failure("ns/b");
        assert_eq!(backoffs.tracked(), 2);

        backoffs.reset("ns/a");
        assert_eq!(backoffs.tracked(), 1);

        backoffs.reset("ns/b");
        backoffs.reset("ns/never-failed");
        assert_eq!(backoffs.tracked(), 0);
    }
}
