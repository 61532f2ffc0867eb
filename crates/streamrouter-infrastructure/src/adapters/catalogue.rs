//! In-memory [`Catalogue`] adapter for tests, the CLI demo binary, and
//! any deployment that does not need an external store.

use std::collections::HashMap;

use async_trait::async_trait;
use streamrouter_domain::entities::{Stream, StreamRule};
use streamrouter_domain::error::Result;
use streamrouter_domain::ports::Catalogue;
use streamrouter_domain::value_objects::StreamId;
use tokio::sync::RwLock;

/// A `Catalogue` backed by an in-process `tokio::sync::RwLock<HashMap<..>>`.
///
/// Rules are stored inline on each [`Stream`], so `load_rules_for` simply
/// re-reads the stream's current rule list — this adapter exists for
/// tests, the CLI binary's demo mode, and local experimentation, not as
/// a model for a real store.
#[derive(Debug, Default)]
pub struct InMemoryCatalogue {
    streams: RwLock<HashMap<StreamId, Stream>>,
}

impl InMemoryCatalogue {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a stream (and its rules).
    pub async fn put(&self, stream: Stream) {
        self.streams.write().await.insert(stream.id.clone(), stream);
    }

    /// Removes a stream entirely.
    pub async fn remove(&self, stream_id: &StreamId) {
        self.streams.write().await.remove(stream_id);
    }
}

#[async_trait]
impl Catalogue for InMemoryCatalogue {
    async fn load_enabled_streams(&self) -> Result<Vec<Stream>> {
        let streams = self.streams.read().await;
        Ok(streams.values().filter(|s| s.enabled).cloned().collect())
    }

    async fn load_rules_for(&self, stream_id: &StreamId) -> Result<Vec<StreamRule>> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(stream_id)
            .map(|s| s.rules.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamrouter_domain::entities::RuleKind;

    #[tokio::test]
    async fn enabled_streams_round_trip() {
        let catalogue = InMemoryCatalogue::new();
        let stream = Stream::new("s1", "t").with_rule(StreamRule::new(
            "r1",
            "s1",
            RuleKind::Presence,
            "f1",
            None,
        ));
        catalogue.put(stream).await;

        let streams = catalogue.load_enabled_streams().await.unwrap();
        assert_eq!(streams.len(), 1);
        let rules = catalogue.load_rules_for(&StreamId::from("s1")).await.unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[tokio::test]
    async fn disabled_streams_are_excluded() {
        let catalogue = InMemoryCatalogue::new();
        let mut stream = Stream::new("s1", "t");
        stream.enabled = false;
        catalogue.put(stream).await;

        assert!(catalogue.load_enabled_streams().await.unwrap().is_empty());
    }
}
