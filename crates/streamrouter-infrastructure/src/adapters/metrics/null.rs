//! No-op [`MetricsProvider`], for tests and the quick-start CLI.

use std::time::Duration;

use async_trait::async_trait;
use streamrouter_domain::error::Result;
use streamrouter_domain::ports::MetricsProvider;
use streamrouter_domain::value_objects::StreamId;

/// A `MetricsProvider` that discards everything it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricsProvider;

impl NullMetricsProvider {
    /// Creates a no-op metrics provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsProvider for NullMetricsProvider {
    fn name(&self) -> &str {
        "null"
    }

    async fn record_incoming_message(&self, _stream_id: &StreamId) -> Result<()> {
        Ok(())
    }

    async fn record_execution(&self, _stream_id: &StreamId, _elapsed: Duration) -> Result<()> {
        Ok(())
    }

    async fn record_exception(&self, _stream_id: &StreamId) -> Result<()> {
        Ok(())
    }

    async fn set_fault_count(&self, _stream_id: &StreamId, _count: u32) -> Result<()> {
        Ok(())
    }

    async fn record_engine_build(&self, _elapsed: Duration, _rule_count: u64) -> Result<()> {
        Ok(())
    }
}
