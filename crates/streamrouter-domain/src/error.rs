//! Error handling types.

use thiserror::Error;

/// Result type alias for operations that can fail.
pub type Result<T> = std::result::Result<T, Error>;

/// Domain-wide error type for the stream-routing engine.
#[derive(Error, Debug)]
pub enum Error {
    /// A field name does not match `[A-Za-z0-9_.\-]+`.
    #[error("invalid field name '{name}'")]
    InvalidFieldName {
        /// The rejected field name.
        name: String,
    },

    /// The generic field setter was used on a reserved field name.
    #[error("field '{name}' is reserved and must be set through its dedicated accessor")]
    ReservedFieldName {
        /// The reserved field name.
        name: String,
    },

    /// A stream rule referenced a rule kind the engine does not recognise.
    #[error("stream {stream_id} rule {rule_id}: invalid rule kind '{kind}'")]
    InvalidRuleKind {
        /// Owning stream id.
        stream_id: String,
        /// Offending rule id.
        rule_id: String,
        /// The unrecognised kind string.
        kind: String,
    },

    /// A regex rule's pattern failed to compile.
    #[error("stream {stream_id} rule {rule_id}: invalid regex '{pattern}': {message}")]
    RegexCompile {
        /// Owning stream id.
        stream_id: String,
        /// Offending rule id.
        rule_id: String,
        /// The pattern that failed to compile.
        pattern: String,
        /// The underlying compiler message.
        message: String,
    },

    /// A matcher produced a runtime fault while evaluating a message.
    #[error("stream {stream_id} rule {rule_id}: matcher runtime error: {message}")]
    MatcherRuntime {
        /// Owning stream id.
        stream_id: String,
        /// Offending rule id.
        rule_id: String,
        /// Description of the failure.
        message: String,
    },

    /// A rule evaluation exceeded `stream_processing_timeout_ms`.
    #[error("stream {stream_id} rule {rule_id}: evaluation exceeded timeout")]
    MatcherTimeout {
        /// Owning stream id.
        stream_id: String,
        /// Offending rule id.
        rule_id: String,
    },

    /// The catalogue could not be loaded for an engine rebuild.
    #[error("catalogue unavailable: {message}")]
    CatalogueUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// A configuration key was missing.
    #[error("missing configuration: {key}")]
    ConfigMissing {
        /// The missing key.
        key: String,
    },

    /// A configuration value was present but invalid.
    #[error("invalid configuration for '{key}': {message}")]
    ConfigInvalid {
        /// The offending key.
        key: String,
        /// Why the value is invalid.
        message: String,
    },

    /// Wraps an I/O failure encountered while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::InvalidFieldName`].
    pub fn invalid_field_name<S: Into<String>>(name: S) -> Self {
        Self::InvalidFieldName { name: name.into() }
    }

    /// Creates an [`Error::ReservedFieldName`].
    pub fn reserved_field_name<S: Into<String>>(name: S) -> Self {
        Self::ReservedFieldName { name: name.into() }
    }

    /// Creates an [`Error::CatalogueUnavailable`].
    pub fn catalogue_unavailable<S: Into<String>>(message: S) -> Self {
        Self::CatalogueUnavailable {
            message: message.into(),
        }
    }

    /// Creates an [`Error::ConfigMissing`].
    pub fn config_missing<S: Into<String>>(key: S) -> Self {
        Self::ConfigMissing { key: key.into() }
    }

    /// Creates an [`Error::ConfigInvalid`].
    pub fn config_invalid<S: Into<String>, M: Into<String>>(key: S, message: M) -> Self {
        Self::ConfigInvalid {
            key: key.into(),
            message: message.into(),
        }
    }
}
