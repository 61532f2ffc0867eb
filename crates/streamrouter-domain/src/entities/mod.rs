//! Core business entities with identity.

mod message;
mod stream;
mod stream_rule;

pub use message::Message;
pub use stream::Stream;
pub use stream_rule::{RuleKind, StreamRule};
