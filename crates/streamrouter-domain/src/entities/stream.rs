//! A logical subscription defined by a conjunction of rules.

use serde::{Deserialize, Serialize};

use super::stream_rule::StreamRule;
use crate::value_objects::StreamId;

/// A named subscription: a message is routed to a stream when every one
/// of its rules matches.
///
/// A stream with zero rules never matches any message (see
/// `streamrouter_application`'s Compiled Engine build algorithm).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    /// Unique id.
    pub id: StreamId,
    /// Human-readable title.
    pub title: String,
    /// Whether the stream participates in engine rebuilds at all.
    pub enabled: bool,
    /// The rules whose conjunction defines this stream's membership.
    pub rules: Vec<StreamRule>,
    /// Administrative pause; a paused stream is still compiled but its
    /// messages are expected to be discarded downstream of routing.
    pub paused: bool,
}

impl Stream {
    /// Creates an enabled, unpaused stream with no rules.
    #[must_use]
    pub fn new(id: impl Into<StreamId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            enabled: true,
            rules: Vec::new(),
            paused: false,
        }
    }

    /// Appends a rule to this stream's conjunction.
    #[must_use]
    pub fn with_rule(mut self, rule: StreamRule) -> Self {
        self.rules.push(rule);
        self
    }
}
