//! # Stream Router
//!
//! Wires the domain, application, and infrastructure layers into a
//! running engine: an [`EngineUpdater`] background task feeding an
//! `ArcSwap`-published [`Engine`][streamrouter_application::Engine], and
//! a [`Router`] façade applications call to route one message at a time.
//!
//! ## Architecture
//!
//! | Crate | Role |
//! |-------|------|
//! | `streamrouter-domain` | Pure entities, value objects, matchers, port contracts |
//! | `streamrouter-application` | Compiled engine, updater, router, fault manager, timeout harness |
//! | `streamrouter-infrastructure` | In-memory catalogue, metrics adapters, configuration |
//! | `streamrouter` (this crate) | Wiring and the `streamrouter` CLI binary |

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use streamrouter_application::{Engine, EngineUpdater, FaultManager, Router, TimeoutHarness};
use streamrouter_domain::ports::{Catalogue, MetricsProvider};
use streamrouter_infrastructure::RouterConfig;

/// A fully wired instance of the stream-routing engine.
///
/// Construction does not start the background rebuild task; call
/// [`StreamRouterApp::spawn_updater`] once a Tokio runtime is running.
pub struct StreamRouterApp<C: Catalogue> {
    /// The public routing façade.
    pub router: Router,
    engine: Arc<ArcSwap<Engine>>,
    faults: Arc<FaultManager>,
    catalogue: C,
    metrics: Arc<dyn MetricsProvider>,
    rebuild_period: Duration,
}

impl<C: Catalogue + Clone + Send + Sync + 'static> StreamRouterApp<C> {
    /// Assembles the engine, fault manager, and router around `catalogue`
    /// and `metrics`, starting from an empty engine (nothing matches
    /// until the first rebuild runs).
    #[must_use]
    pub fn new(catalogue: C, metrics: Arc<dyn MetricsProvider>, config: RouterConfig) -> Self {
        let (empty_engine, _) = Engine::build(Vec::new(), &Default::default());
        let engine = Arc::new(ArcSwap::from_pointee(empty_engine));
        let faults = Arc::new(FaultManager::new(config.stream_processing_max_faults));
        let harness = TimeoutHarness::new(Duration::from_millis(
            config.stream_processing_timeout_ms,
        ));
        let router = Router::new(
            Arc::clone(&engine),
            Arc::clone(&faults),
            harness,
            Arc::clone(&metrics),
            config.detailed_message_recording,
        );

        Self {
            router,
            engine,
            faults,
            catalogue,
            metrics,
            rebuild_period: Duration::from_millis(config.engine_rebuild_period_ms),
        }
    }

    /// Runs one rebuild cycle immediately, useful for tests and for a
    /// CLI that wants a populated engine before accepting its first
    /// message rather than waiting for the first periodic tick.
    pub async fn rebuild_once(&self) {
        self.updater().tick().await;
    }

    /// Spawns the Engine Updater as a background Tokio task, rebuilding
    /// every `engine_rebuild_period_ms`. Returns the task's `JoinHandle`;
    /// dropping it does not stop the task (abort it explicitly to stop).
    pub fn spawn_updater(&self) -> tokio::task::JoinHandle<()>
    where
        C: 'static,
    {
        let updater = self.updater();
        tokio::spawn(updater.run())
    }

    fn updater(&self) -> EngineUpdater<C> {
        EngineUpdater::new(
            self.catalogue.clone(),
            Arc::clone(&self.engine),
            Arc::clone(&self.faults),
            Arc::clone(&self.metrics),
            self.rebuild_period,
        )
    }
}
