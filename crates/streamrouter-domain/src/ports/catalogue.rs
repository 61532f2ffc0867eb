//!
//! Port the Engine Updater reads the stream/rule catalogue through.
//!
//! The real implementation lives outside this repository's scope (a
//! document store, per the system overview); [`streamrouter_infrastructure`]
//! ships an in-memory adapter for tests, examples, and the CLI binary.

use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::{Stream, StreamRule};
use crate::error::Result;
use crate::value_objects::StreamId;

/// Read-only access to the externally-owned stream/rule catalogue.
///
/// Both operations may fail (the store is unreachable, a row is
/// malformed); the Engine Updater logs the failure and retains the
/// currently-published engine rather than propagating the error.
#[async_trait]
pub trait Catalogue: Send + Sync {
    /// Loads every stream that currently has `enabled == true`.
    ///
    /// The returned streams' `rules` field is not populated by this call;
    /// use [`Catalogue::load_rules_for`] per stream.
    async fn load_enabled_streams(&self) -> Result<Vec<Stream>>;

    /// Loads the rules declared on `stream_id`.
    async fn load_rules_for(&self, stream_id: &StreamId) -> Result<Vec<StreamRule>>;
}

#[async_trait]
impl<T> Catalogue for Arc<T>
where
    T: Catalogue + ?Sized,
{
    async fn load_enabled_streams(&self) -> Result<Vec<Stream>> {
        (**self).load_enabled_streams().await
    }

    async fn load_rules_for(&self, stream_id: &StreamId) -> Result<Vec<StreamRule>> {
        (**self).load_rules_for(stream_id).await
    }
}
