//! The value types a message field may hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value stored under a message field name.
///
/// Matchers consume every variant through its string form; [`FieldValue::Greater`]
/// and [`FieldValue::Smaller`] rules additionally require a numeric coercion,
/// which fails closed (non-match) rather than panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A UTF-8 string, already trimmed and non-empty.
    String(String),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Double(f64),
    /// A tagged UTC timestamp.
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Renders the value in the string form matchers operate on.
    #[must_use]
    pub fn as_match_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Double(d) => d.to_string(),
            Self::Timestamp(t) => t.to_rfc3339(),
        }
    }

    /// Coerces the value to `f64` for Greater/Smaller comparisons.
    ///
    /// Returns `None` rather than erroring when the value cannot be parsed
    /// as a number — Greater/Smaller rules treat that as a non-match.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            Self::Timestamp(t) => Some(t.timestamp() as f64),
        }
    }

    /// True iff the string form is non-empty.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !self.as_match_string().is_empty()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}
