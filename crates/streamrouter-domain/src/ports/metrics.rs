#![allow(missing_docs)]

//! Metrics port the Router façade and Engine Updater report through.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;
use crate::value_objects::StreamId;

/// Backend-agnostic metrics sink.
///
/// [`streamrouter_infrastructure`] ships a no-op implementation for tests
/// and a Prometheus-backed implementation for production use.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// The backend's name, for diagnostics.
    fn name(&self) -> &str;

    /// Increments `stream_id`'s `incoming_messages` counter by one.
    async fn record_incoming_message(&self, stream_id: &StreamId) -> Result<()>;

    /// Records one rule-evaluation pass for `stream_id`.
    async fn record_execution(&self, stream_id: &StreamId, elapsed: Duration) -> Result<()>;

    /// Increments `stream_id`'s `exception_meter`.
    async fn record_exception(&self, stream_id: &StreamId) -> Result<()>;

    /// Sets `stream_id`'s current fault-counter gauge value.
    async fn set_fault_count(&self, stream_id: &StreamId, count: u32) -> Result<()>;

    /// Increments the process-wide `engine_builds_total` counter.
    async fn record_engine_build(&self, elapsed: Duration, rule_count: u64) -> Result<()>;
}
