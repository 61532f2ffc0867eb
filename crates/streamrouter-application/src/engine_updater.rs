//! Background task that periodically rebuilds and publishes the engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use streamrouter_domain::ports::{Catalogue, MetricsProvider};

use crate::compiled_engine::Engine;
use crate::fault_manager::FaultManager;

/// Periodically reloads the catalogue, rebuilds the [`Engine`], and
/// publishes it into a shared `ArcSwap` slot when its fingerprint has
/// changed, so `Router::route` never sees a half-built engine.
pub struct EngineUpdater<C: Catalogue> {
    catalogue: C,
    engine: Arc<ArcSwap<Engine>>,
    faults: Arc<FaultManager>,
    metrics: Arc<dyn MetricsProvider>,
    period: Duration,
}

impl<C: Catalogue> EngineUpdater<C> {
    /// Creates an updater that rebuilds every `period` and publishes into
    /// `engine`.
    #[must_use]
    pub fn new(
        catalogue: C,
        engine: Arc<ArcSwap<Engine>>,
        faults: Arc<FaultManager>,
        metrics: Arc<dyn MetricsProvider>,
        period: Duration,
    ) -> Self {
        Self {
            catalogue,
            engine,
            faults,
            metrics,
            period,
        }
    }

    /// Runs one rebuild-and-maybe-swap cycle.
    ///
    /// A catalogue error is logged and the currently published engine is
    /// retained — a transient store outage must never blank the routing
    /// table.
    pub async fn tick(&self) {
        let mut streams = match self.catalogue.load_enabled_streams().await {
            Ok(streams) => streams,
            Err(err) => {
                tracing::warn!(%err, "engine updater: catalogue unavailable, keeping current engine");
                return;
            }
        };

        for stream in &mut streams {
            match self.catalogue.load_rules_for(&stream.id).await {
                Ok(rules) => stream.rules = rules,
                Err(err) => {
                    tracing::warn!(stream_id = %stream.id, %err, "engine updater: failed to load rules, dropping stream from this build");
                    stream.rules.clear();
                    stream.enabled = false;
                }
            }
        }

        let quarantined = self.faults.quarantined_snapshot();
        let started = Instant::now();
        let (new_engine, stats) = Engine::build(streams, &quarantined);
        let elapsed = started.elapsed();

        if let Err(err) = self
            .metrics
            .record_engine_build(elapsed, stats.indexed_rules as u64)
            .await
        {
            tracing::debug!(%err, "metrics: record_engine_build failed");
        }

        let current_fingerprint = self.engine.load().fingerprint();
        if new_engine.fingerprint() == current_fingerprint {
            tracing::debug!("engine updater: catalogue unchanged, skipping swap");
            return;
        }

        tracing::info!(
            fingerprint = new_engine.fingerprint(),
            dropped_streams = stats.dropped_streams,
            indexed_rules = stats.indexed_rules,
            build_ms = elapsed.as_millis(),
            "engine updater: publishing new engine"
        );
        self.engine.store(Arc::new(new_engine));
    }

    /// Runs [`EngineUpdater::tick`] in a loop, sleeping `period` between
    /// iterations, until cancelled.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use streamrouter_domain::entities::{RuleKind, Stream, StreamRule};
    use streamrouter_domain::error::Result as DomainResult;
    use streamrouter_domain::value_objects::StreamId;
    use tokio::sync::Mutex;

    struct StaticCatalogue {
        streams: Mutex<Vec<Stream>>,
    }

    #[async_trait]
    impl Catalogue for StaticCatalogue {
        async fn load_enabled_streams(&self) -> DomainResult<Vec<Stream>> {
            Ok(self.streams.lock().await.clone())
        }

        async fn load_rules_for(&self, stream_id: &StreamId) -> DomainResult<Vec<StreamRule>> {
            Ok(self
                .streams
                .lock()
                .await
                .iter()
                .find(|s| &s.id == stream_id)
                .map(|s| s.rules.clone())
                .unwrap_or_default())
        }
    }

    struct NullMetrics;

    #[async_trait]
    impl MetricsProvider for NullMetrics {
        fn name(&self) -> &str {
            "null"
        }
        async fn record_incoming_message(&self, _stream_id: &StreamId) -> DomainResult<()> {
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
    async fn tick_publishes_a_new_engine_when_fingerprint_changes() {
        let stream = Stream::new("s1", "t").with_rule(StreamRule::new(
            "r1",
            "s1",
            RuleKind::Presence,
            "f1",
            None,
        ));
        let catalogue = StaticCatalogue {
            streams: Mutex::new(vec![stream]),
        };
        let engine = Arc::new(ArcSwap::from_pointee(
            Engine::build(Vec::new(), &Default::default()).0,
        ));
        let updater = EngineUpdater::new(
            catalogue,
            Arc::clone(&engine),
            Arc::new(FaultManager::new(3)),
            Arc::new(NullMetrics),
            Duration::from_millis(10),
        );

        updater.tick().await;
        assert_eq!(engine.load().rule_count(&StreamId::from("s1")), 1);
    }

    #[tokio::test]
    async fn tick_skips_swap_when_catalogue_is_unchanged() {
        let stream = Stream::new("s1", "t").with_rule(StreamRule::new(
            "r1",
            "s1",
            RuleKind::Presence,
            "f1",
            None,
        ));
        let catalogue = StaticCatalogue {
            streams: Mutex::new(vec![stream]),
        };
        let engine = Arc::new(ArcSwap::from_pointee(
            Engine::build(Vec::new(), &Default::default()).0,
        ));
        let updater = EngineUpdater::new(
            catalogue,
            Arc::clone(&engine),
            Arc::new(FaultManager::new(3)),
            Arc::new(NullMetrics),
            Duration::from_millis(10),
        );

        updater.tick().await;
        let first_fingerprint = engine.load().fingerprint();
        updater.tick().await;
        assert_eq!(engine.load().fingerprint(), first_fingerprint);
    }
}
