//! The public entry point: routes a message through the current engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use streamrouter_domain::entities::{Message, Stream};
use streamrouter_domain::ports::MetricsProvider;
use streamrouter_domain::value_objects::StreamId;

use crate::compiled_engine::Engine;
use crate::fault_manager::FaultManager;
use crate::timeout_harness::TimeoutHarness;

/// Routes inbound messages against the currently published [`Engine`].
///
/// Cloning a `Router` is cheap — every clone shares the same `ArcSwap`
/// slot, fault manager, and metrics sink, and observes engine swaps
/// published by the Engine Updater immediately.
#[derive(Clone)]
pub struct Router {
    engine: Arc<ArcSwap<Engine>>,
    faults: Arc<FaultManager>,
    harness: TimeoutHarness,
    metrics: Arc<dyn MetricsProvider>,
    detailed_recording: bool,
}

impl Router {
    /// Creates a router over a shared engine slot.
    #[must_use]
    pub fn new(
        engine: Arc<ArcSwap<Engine>>,
        faults: Arc<FaultManager>,
        harness: TimeoutHarness,
        metrics: Arc<dyn MetricsProvider>,
        detailed_recording: bool,
    ) -> Self {
        Self {
            engine,
            faults,
            harness,
            metrics,
            detailed_recording,
        }
    }

    /// Routes `message` against the current engine snapshot.
    ///
    /// Never errors: a matcher timeout or panic is recorded against its
    /// owning stream's fault count and treated as a non-match, so one
    /// misbehaving rule cannot block evaluation of the rest of the
    /// conjunction or of other streams. The returned list follows the
    /// engine's catalogue order at the time of the last rebuild.
    ///
    /// `message` is taken by exclusive reference rather than by value: a
    /// snapshot is shared with the per-rule timeout harness via `Arc` for
    /// the duration of evaluation, and once that snapshot is dropped the
    /// caller's original is mutated to attach recordings, so callers keep
    /// a single owned `Message` across the whole routing call.
    pub async fn route(&self, message: &mut Message) -> Vec<Stream> {
        let engine = self.engine.load_full();
        let started = Instant::now();
        let shared = Arc::new(message.clone());
        let candidates = engine.candidates(&shared);
        let rules_evaluated = candidates.len();

        let mut seen_streams: std::collections::HashSet<StreamId> = std::collections::HashSet::new();
        let mut tally: HashMap<StreamId, usize> = HashMap::new();
        for candidate in candidates {
            if seen_streams.insert(candidate.stream_id.clone())
                && let Err(err) = self
                    .metrics
                    .record_incoming_message(&candidate.stream_id)
                    .await
            {
                tracing::debug!(%err, "metrics: record_incoming_message failed");
            }

            let stream_id = candidate.stream_id.clone();
            let matched = self
                .harness
                .evaluate(
                    Arc::clone(&shared),
                    candidate.rule,
                    candidate.compiled_regex,
                    &stream_id,
                    &self.faults,
                    self.metrics.as_ref(),
                )
                .await;
            if matched {
                *tally.entry(stream_id).or_insert(0) += 1;
            }
        }

        let matched_streams = engine.resolve_tally(&tally);

        let elapsed = started.elapsed();
        if self.detailed_recording {
            let recordings = message.recordings_mut();
            recordings.record_timing("router.route", elapsed);
            recordings.increment_counter("rules.evaluated", rules_evaluated as u64);
            recordings.increment_counter("streams.evaluated", seen_streams.len() as u64);
            recordings.increment_counter("streams.matched", matched_streams.len() as u64);
        }
        for stream_id in &seen_streams {
            if let Err(err) = self.metrics.record_execution(stream_id, elapsed).await {
                tracing::debug!(%err, "metrics: record_execution failed");
            }
            if let Err(err) = self
                .metrics
                .set_fault_count(stream_id, self.faults.fault_count(stream_id))
                .await
            {
                tracing::debug!(%err, "metrics: set_fault_count failed");
            }
        }

        matched_streams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use streamrouter_domain::entities::{RuleKind, StreamRule};
    use streamrouter_domain::error::Result as DomainResult;

    #[derive(Default)]
    struct CountingMetrics {
        incoming: AtomicUsize,
    }

    #[async_trait]
    impl MetricsProvider for CountingMetrics {
        fn name(&self) -> &str {
            "counting"
        }

        async fn record_incoming_message(&self, _stream_id: &StreamId) -> DomainResult<()> {
            self.incoming.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn record_execution(&self, _stream_id: &StreamId, _elapsed: Duration) -> DomainResult<()> {
            Ok(())
        }

        async fn record_exception(&self, _stream_id: &StreamId) -> DomainResult<()> {
            Ok(())
        }

        async fn set_fault_count(&self, _stream_id: &StreamId, _count: u32) -> DomainResult<()> {
            Ok(())
        }

        async fn record_engine_build(&self, _elapsed: Duration, _rule_count: u64) -> DomainResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn route_returns_matching_streams() {
        let stream = streamrouter_domain::entities::Stream::new("s1", "t").with_rule(
            StreamRule::new("r1", "s1", RuleKind::Presence, "f1", None),
        );
        let (engine, _) = Engine::build(vec![stream], &HashSet::new());

        let router = Router::new(
            Arc::new(ArcSwap::from_pointee(engine)),
            Arc::new(FaultManager::new(3)),
            TimeoutHarness::new(Duration::from_millis(200)),
            Arc::new(CountingMetrics::default()),
            false,
        );

        #[allow(clippy::unwrap_used)]
        let mut message = Message::new("m1", "body", "host", Utc::now()).unwrap();
        message.set_field("f1", streamrouter_domain::value_objects::FieldValue::from("x")).unwrap();

        let matched = router.route(&mut message).await;
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id.as_str(), "s1");
    }

    #[tokio::test]
    async fn detailed_recording_attaches_counts_to_the_message() {
        let stream = streamrouter_domain::entities::Stream::new("s1", "t").with_rule(
            StreamRule::new("r1", "s1", RuleKind::Presence, "f1", None),
        );
        let (engine, _) = Engine::build(vec![stream], &HashSet::new());

        let router = Router::new(
            Arc::new(ArcSwap::from_pointee(engine)),
            Arc::new(FaultManager::new(3)),
            TimeoutHarness::new(Duration::from_millis(200)),
            Arc::new(CountingMetrics::default()),
            true,
        );

        #[allow(clippy::unwrap_used)]
        let mut message = Message::new("m1", "body", "host", Utc::now()).unwrap();
        message.set_field("f1", streamrouter_domain::value_objects::FieldValue::from("x")).unwrap();

        router.route(&mut message).await;

        let recordings = message.recordings().expect("recordings should be attached");
        assert!(recordings.timing("router.route").is_some());
        assert_eq!(recordings.counter("streams.matched"), 1);
        assert_eq!(recordings.counter("streams.evaluated"), 1);
    }
}
