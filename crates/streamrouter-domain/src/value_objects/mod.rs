//! Immutable value objects shared across the domain layer.

mod field_value;
mod ids;
mod recordings;

pub use field_value::FieldValue;
pub use ids::{MessageId, RuleId, StreamId};
pub use recordings::Recordings;
