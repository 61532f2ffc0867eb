//! Prometheus-backed [`MetricsProvider`] implementation.
//!
//! ## Metrics exported
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `streamrouter_incoming_messages_total` | Counter | `stream_id` | Messages considered for a stream |
//! | `streamrouter_execution_seconds` | Histogram | `stream_id` | Per-stream rule-evaluation duration |
//! | `streamrouter_exceptions_total` | Counter | `stream_id` | Matcher faults (timeouts, panics) |
//! | `streamrouter_fault_count` | Gauge | `stream_id` | Current consecutive fault count |
//! | `streamrouter_engine_builds_total` | Counter | - | Completed engine rebuilds |
//! | `streamrouter_engine_build_seconds` | Histogram | - | Engine rebuild duration |
//! | `streamrouter_engine_rule_count` | Gauge | - | Rules indexed in the last build |

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramVec, register_counter,
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram,
    register_histogram_vec,
};
use streamrouter_domain::error::{Error, Result};
use streamrouter_domain::ports::MetricsProvider;
use streamrouter_domain::value_objects::StreamId;

static METRICS: OnceLock<std::result::Result<Inner, String>> = OnceLock::new();

struct Inner {
    incoming: CounterVec,
    execution: HistogramVec,
    exceptions: CounterVec,
    fault_count: GaugeVec,
    builds_total: Counter,
    build_duration: Histogram,
    build_rule_count: Gauge,
}

impl Inner {
    fn try_new() -> std::result::Result<Self, String> {
        Ok(Self {
            incoming: register_counter_vec!(
                "streamrouter_incoming_messages_total",
                "Messages considered for a stream",
                &["stream_id"]
            )
            .map_err(|e| e.to_string())?,
            execution: register_histogram_vec!(
                "streamrouter_execution_seconds",
                "Per-stream rule-evaluation duration",
                &["stream_id"]
            )
            .map_err(|e| e.to_string())?,
            exceptions: register_counter_vec!(
                "streamrouter_exceptions_total",
                "Matcher faults (timeouts, panics)",
                &["stream_id"]
            )
            .map_err(|e| e.to_string())?,
            fault_count: register_gauge_vec!(
                "streamrouter_fault_count",
                "Current consecutive fault count",
                &["stream_id"]
            )
            .map_err(|e| e.to_string())?,
            builds_total: register_counter!(
                "streamrouter_engine_builds_total",
                "Completed engine rebuilds"
            )
            .map_err(|e| e.to_string())?,
            build_duration: register_histogram!(
                "streamrouter_engine_build_seconds",
                "Engine rebuild duration"
            )
            .map_err(|e| e.to_string())?,
            build_rule_count: register_gauge!(
                "streamrouter_engine_rule_count",
                "Rules indexed in the last build"
            )
            .map_err(|e| e.to_string())?,
        })
    }
}

/// Metrics backed by the process-global Prometheus registry.
///
/// Metrics are registered once on first construction and shared by every
/// instance; constructing a second `PrometheusMetricsProvider` is cheap
/// and observes the same counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusMetricsProvider;

impl PrometheusMetricsProvider {
    /// Registers (if not already registered) and returns a metrics
    /// provider backed by the global Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CatalogueUnavailable`]-shaped diagnostics wrapped
    /// as a plain error if registration fails (e.g. a metric name
    /// collides with one already registered by another component).
    pub fn try_new() -> Result<Self> {
        match METRICS.get_or_init(Inner::try_new) {
            Ok(_) => Ok(Self),
            Err(message) => Err(Error::catalogue_unavailable(format!(
                "prometheus metrics registration failed: {message}"
            ))),
        }
    }

    fn inner(&self) -> Option<&'static Inner> {
        METRICS.get().and_then(|r| r.as_ref().ok())
    }
}

#[async_trait]
impl MetricsProvider for PrometheusMetricsProvider {
    fn name(&self) -> &str {
        "prometheus"
    }

    async fn record_incoming_message(&self, stream_id: &StreamId) -> Result<()> {
        if let Some(inner) = self.inner() {
            inner.incoming.with_label_values(&[stream_id.as_str()]).inc();
        }
        Ok(())
    }

    async fn record_execution(&self, stream_id: &StreamId, elapsed: Duration) -> Result<()> {
        if let Some(inner) = self.inner() {
            inner
                .execution
                .with_label_values(&[stream_id.as_str()])
                .observe(elapsed.as_secs_f64());
        }
        Ok(())
    }

    async fn record_exception(&self, stream_id: &StreamId) -> Result<()> {
        if let Some(inner) = self.inner() {
            inner.exceptions.with_label_values(&[stream_id.as_str()]).inc();
        }
        Ok(())
    }

    async fn set_fault_count(&self, stream_id: &StreamId, count: u32) -> Result<()> {
        if let Some(inner) = self.inner() {
            inner
                .fault_count
                .with_label_values(&[stream_id.as_str()])
                .set(f64::from(count));
        }
        Ok(())
    }

    async fn record_engine_build(&self, elapsed: Duration, rule_count: u64) -> Result<()> {
        if let Some(inner) = self.inner() {
            inner.builds_total.inc();
            inner.build_duration.observe(elapsed.as_secs_f64());
            #[allow(clippy::cast_precision_loss)]
            inner.build_rule_count.set(rule_count as f64);
        }
        Ok(())
    }
}
