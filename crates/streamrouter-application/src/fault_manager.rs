//! Per-stream fault counting and quarantine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use streamrouter_domain::value_objects::StreamId;

/// Tracks consecutive matcher faults (timeouts or panics) per stream and
/// quarantines a stream once its fault count crosses the configured
/// threshold — the Engine Updater excludes quarantined streams from the
/// next build.
#[derive(Debug)]
pub struct FaultManager {
    counts: DashMap<StreamId, AtomicU32>,
    quarantined: DashMap<StreamId, ()>,
    max_faults: u32,
}

impl FaultManager {
    /// Creates a fault manager that quarantines a stream once its fault
    /// count reaches `max_faults`.
    #[must_use]
    pub fn new(max_faults: u32) -> Self {
        Self {
            counts: DashMap::new(),
            quarantined: DashMap::new(),
            max_faults,
        }
    }

    /// Records one matcher fault for `stream_id`, quarantining it if the
    /// new count reaches the configured threshold. Returns the updated
    /// count.
    pub fn register_failure(&self, stream_id: &StreamId) -> u32 {
        let counter = self
            .counts
            .entry(stream_id.clone())
            .or_insert_with(|| AtomicU32::new(0));
        let count = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if count >= self.max_faults {
            self.quarantined.insert(stream_id.clone(), ());
            tracing::warn!(%stream_id, count, "stream quarantined after repeated matcher faults");
        }
        count
    }

    /// Clears a stream's fault count and lifts its quarantine, if any.
    pub fn clear(&self, stream_id: &StreamId) {
        self.counts.remove(stream_id);
        self.quarantined.remove(stream_id);
    }

    /// Current fault count for `stream_id`, zero if never recorded.
    #[must_use]
    pub fn fault_count(&self, stream_id: &StreamId) -> u32 {
        self.counts
            .get(stream_id)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// True iff `stream_id` is currently quarantined.
    #[must_use]
    pub fn is_quarantined(&self, stream_id: &StreamId) -> bool {
        self.quarantined.contains_key(stream_id)
    }

    /// A snapshot of every currently quarantined stream id, for the
    /// Engine Updater's build filter.
    #[must_use]
    pub fn quarantined_snapshot(&self) -> HashSet<StreamId> {
        self.quarantined.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarantines_after_max_faults() {
        let faults = FaultManager::new(3);
        let stream_id = StreamId::from("s1");
        assert!(!faults.is_quarantined(&stream_id));
        faults.register_failure(&stream_id);
        faults.register_failure(&stream_id);
        assert!(!faults.is_quarantined(&stream_id));
        faults.register_failure(&stream_id);
        assert!(faults.is_quarantined(&stream_id));
        assert_eq!(faults.fault_count(&stream_id), 3);
    }

    #[test]
    fn clear_lifts_quarantine() {
        let faults = FaultManager::new(1);
        let stream_id = StreamId::from("s1");
        faults.register_failure(&stream_id);
        assert!(faults.is_quarantined(&stream_id));
        faults.clear(&stream_id);
        assert!(!faults.is_quarantined(&stream_id));
        assert_eq!(faults.fault_count(&stream_id), 0);
    }

    #[test]
    fn snapshot_reflects_all_quarantined_streams() {
        let faults = FaultManager::new(1);
        faults.register_failure(&StreamId::from("s1"));
        faults.register_failure(&StreamId::from("s2"));
        let snapshot = faults.quarantined_snapshot();
        assert_eq!(snapshot.len(), 2);
    }
}
