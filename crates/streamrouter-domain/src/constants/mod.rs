//! Domain-level constants.

/// Field names that carry special meaning and cannot be set through the
/// generic [`crate::entities::Message::set_field`] accessor.
///
/// A subset of these (`message`, `source`, `timestamp`) is settable only
/// through the dedicated constructor/accessors on [`crate::entities::Message`].
pub const RESERVED_FIELD_NAMES: &[&str] = &[
    "_id",
    "id",
    "message",
    "source",
    "timestamp",
    "streams",
    "full_message",
];

/// Reserved fields that additionally have a dedicated typed accessor.
pub const CORE_FIELD_NAMES: &[&str] = &["message", "source", "timestamp"];

/// Default per-rule evaluation timeout, in milliseconds.
pub const DEFAULT_STREAM_PROCESSING_TIMEOUT_MS: u64 = 2_000;

/// Default number of faults tolerated before a stream is quarantined.
pub const DEFAULT_STREAM_PROCESSING_MAX_FAULTS: u32 = 3;

/// Default period between Engine Updater rebuilds, in milliseconds.
pub const DEFAULT_ENGINE_REBUILD_PERIOD_MS: u64 = 1_000;

/// Upper bound on a regex rule's literal pattern length, enforced at build
/// time as a substitute for cooperative cancellation (see design notes).
pub const MAX_REGEX_PATTERN_LEN: usize = 512;
