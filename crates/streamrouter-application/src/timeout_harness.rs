//! Per-rule timeout and panic isolation.
//!
//! `regex` offers no cooperative-cancellation API, so a runaway pattern
//! cannot be interrupted mid-evaluation. Each rule instead runs on a
//! blocking-pool thread under [`tokio::time::timeout`]; a timeout leaves
//! that thread running to completion in the background (bounded only by
//! the regex pattern-length cap enforced at build time) while the caller
//! moves on and records the rule as a non-match.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use streamrouter_domain::entities::{Message, StreamRule};
use streamrouter_domain::matching;
use streamrouter_domain::ports::MetricsProvider;
use streamrouter_domain::value_objects::StreamId;

use crate::fault_manager::FaultManager;

/// Evaluates rules with a per-rule deadline, isolating timeouts and
/// panics as faults rather than letting them propagate.
#[derive(Debug, Clone)]
pub struct TimeoutHarness {
    timeout: Duration,
}

impl TimeoutHarness {
    /// Creates a harness bounding every rule evaluation to `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Evaluates `rule` against `message` on the blocking pool.
    ///
    /// A timeout or a matcher panic is reported to `faults` as one
    /// failure for `stream_id` and resolves to `false` (non-match); the
    /// caller's tally is never blocked indefinitely.
    pub async fn evaluate(
        &self,
        message: Arc<Message>,
        rule: StreamRule,
        compiled_regex: Option<Regex>,
        stream_id: &StreamId,
        faults: &FaultManager,
        metrics: &dyn MetricsProvider,
    ) -> bool {
        let handle = tokio::task::spawn_blocking(move || {
            matching::evaluate(&message, &rule, compiled_regex.as_ref())
        });

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                tracing::warn!(%stream_id, %join_error, "matcher panicked");
                faults.register_failure(stream_id);
                if let Err(err) = metrics.record_exception(stream_id).await {
                    tracing::debug!(%err, "metrics: record_exception failed");
                }
                false
            }
            Err(_elapsed) => {
                tracing::warn!(%stream_id, timeout_ms = %self.timeout.as_millis(), "matcher timed out");
                faults.register_failure(stream_id);
                if let Err(err) = metrics.record_exception(stream_id).await {
                    tracing::debug!(%err, "metrics: record_exception failed");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use streamrouter_domain::entities::RuleKind;
    use streamrouter_domain::error::Result as DomainResult;

    struct NoopMetrics;

    #[async_trait]
    impl MetricsProvider for NoopMetrics {
        fn name(&self) -> &str {
            "noop"
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
    async fn evaluates_within_budget() {
        let harness = TimeoutHarness::new(Duration::from_millis(500));
        let faults = FaultManager::new(3);
        #[allow(clippy::unwrap_used)]
        let message = Arc::new(Message::new("m1", "body", "host", Utc::now()).unwrap());
        let rule = StreamRule::new("r1", "s1", RuleKind::Presence, "message", None);
        let stream_id = StreamId::from("s1");

        let result = harness
            .evaluate(message, rule, None, &stream_id, &faults, &NoopMetrics)
            .await;
        assert!(result);
        assert_eq!(faults.fault_count(&stream_id), 0);
    }
}
