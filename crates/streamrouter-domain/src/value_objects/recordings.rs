//! Per-message diagnostic recordings.
//!
//! Populated by [`crate::entities::Message::recordings_mut`] calls from
//! the Router façade when `detailed_message_recording` is enabled;
//! otherwise left empty to avoid the bookkeeping cost on the hot path.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timings and counters captured while routing a single message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recordings {
    /// Named elapsed-time entries (e.g. `"engine.match"`).
    timings: HashMap<String, Duration>,
    /// Named counters (e.g. streams evaluated, rules evaluated).
    counters: HashMap<String, u64>,
}

impl Recordings {
    /// Creates an empty recordings buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an elapsed duration under `name`, overwriting any prior value.
    pub fn record_timing(&mut self, name: impl Into<String>, elapsed: Duration) {
        self.timings.insert(name.into(), elapsed);
    }

    /// Increments the named counter by `delta`.
    pub fn increment_counter(&mut self, name: impl Into<String>, delta: u64) {
        *self.counters.entry(name.into()).or_insert(0) += delta;
    }

    /// Returns the recorded timing for `name`, if any.
    #[must_use]
    pub fn timing(&self, name: &str) -> Option<Duration> {
        self.timings.get(name).copied()
    }

    /// Returns the recorded counter for `name`, defaulting to zero.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }
}
