//! The inbound log record routed through the engine.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::constants::RESERVED_FIELD_NAMES;
use crate::error::{Error, Result};
use crate::value_objects::{FieldValue, MessageId, Recordings, StreamId};

fn field_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap()
    })
}

/// One log record: a unique id, the three mandatory fields, an open
/// field map, and the bookkeeping the routing pipeline attaches.
///
/// Invariant: `id` and the `message` field are always non-empty for any
/// `Message` that was constructed through [`Message::new`].
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    fields: HashMap<String, FieldValue>,
    assigned_streams: Vec<StreamId>,
    filter_out: bool,
    journal_offset: Option<u64>,
    recordings: Option<Recordings>,
}

impl Message {
    /// Creates a message with its three mandatory fields populated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFieldName`] if `id` or `message` is empty
    /// after trimming — both must be non-empty per the type's invariant.
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::invalid_field_name("id"));
        }

        let message = message.into();
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_field_name("message"));
        }

        let mut fields = HashMap::new();
        fields.insert("message".to_owned(), FieldValue::String(trimmed.to_owned()));
        fields.insert(
            "source".to_owned(),
            FieldValue::String(source.into().trim().to_owned()),
        );
        fields.insert("timestamp".to_owned(), FieldValue::Timestamp(timestamp));

        Ok(Self {
            id: MessageId::new(id),
            fields,
            assigned_streams: Vec::new(),
            filter_out: false,
            journal_offset: None,
            recordings: None,
        })
    }

    /// The message's unique id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// The mandatory `message` body.
    #[must_use]
    pub fn message(&self) -> &str {
        match self.fields.get("message") {
            Some(FieldValue::String(s)) => s,
            _ => "",
        }
    }

    /// The mandatory `source` field.
    #[must_use]
    pub fn source(&self) -> &str {
        match self.fields.get("source") {
            Some(FieldValue::String(s)) => s,
            _ => "",
        }
    }

    /// The mandatory `timestamp` field.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self.fields.get("timestamp") {
            Some(FieldValue::Timestamp(t)) => Some(*t),
            _ => None,
        }
    }

    /// Looks up an arbitrary field by name, reserved or not.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// The full field map, including the three mandatory fields.
    #[must_use]
    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    /// The set of field names currently populated on this message.
    #[must_use]
    pub fn field_names(&self) -> HashSet<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    /// Sets a non-reserved field.
    ///
    /// String values are trimmed; a value that trims to empty is dropped
    /// (the field is removed, or never inserted) rather than stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFieldName`] if `name` does not match
    /// `[A-Za-z0-9_.\-]+`, or [`Error::ReservedFieldName`] if `name` is
    /// one of [`RESERVED_FIELD_NAMES`].
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) -> Result<()> {
        let name = name.into();
        if !field_name_pattern().is_match(&name) {
            return Err(Error::invalid_field_name(name));
        }
        if RESERVED_FIELD_NAMES.contains(&name.as_str()) {
            return Err(Error::reserved_field_name(name));
        }

        let value = match value {
            FieldValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    self.fields.remove(&name);
                    return Ok(());
                }
                FieldValue::String(trimmed.to_owned())
            }
            other => other,
        };
        self.fields.insert(name, value);
        Ok(())
    }

    /// Overwrites the mandatory `message` field.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.fields.insert(
            "message".to_owned(),
            FieldValue::String(message.into().trim().to_owned()),
        );
    }

    /// Overwrites the mandatory `source` field.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.fields.insert(
            "source".to_owned(),
            FieldValue::String(source.into().trim().to_owned()),
        );
    }

    /// Overwrites the mandatory `timestamp` field.
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        self.fields
            .insert("timestamp".to_owned(), FieldValue::Timestamp(timestamp));
    }

    /// The streams this message has been routed to so far, if any.
    #[must_use]
    pub fn assigned_streams(&self) -> &[StreamId] {
        &self.assigned_streams
    }

    /// Appends a stream id to the assignment list (idempotent).
    pub fn assign_stream(&mut self, stream_id: StreamId) {
        if !self.assigned_streams.contains(&stream_id) {
            self.assigned_streams.push(stream_id);
        }
    }

    /// Whether this message has been marked for discard by an upstream
    /// pipeline stage. The routing engine itself never sets this flag.
    #[must_use]
    pub fn is_filtered_out(&self) -> bool {
        self.filter_out
    }

    /// Sets the filter-out flag.
    pub fn set_filtered_out(&mut self, filter_out: bool) {
        self.filter_out = filter_out;
    }

    /// The journal offset this message was read from, if tracked.
    #[must_use]
    pub fn journal_offset(&self) -> Option<u64> {
        self.journal_offset
    }

    /// Sets the journal offset.
    pub fn set_journal_offset(&mut self, offset: u64) {
        self.journal_offset = Some(offset);
    }

    /// The per-message diagnostic recordings buffer, if one is active.
    #[must_use]
    pub fn recordings(&self) -> Option<&Recordings> {
        self.recordings.as_ref()
    }

    /// Activates the recordings buffer (idempotent) and returns it
    /// mutably for the router to populate.
    pub fn recordings_mut(&mut self) -> &mut Recordings {
        self.recordings.get_or_insert_with(Recordings::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        #[allow(clippy::unwrap_used)]
        Message::new("m-1", "hello", "host-a", Utc::now()).unwrap()
    }

    #[test]
    fn mandatory_fields_are_present_after_construction() {
        let msg = sample();
        assert_eq!(msg.message(), "hello");
        assert_eq!(msg.source(), "host-a");
        assert!(msg.timestamp().is_some());
        assert_eq!(msg.id(), "m-1");
    }

    #[test]
    fn empty_message_body_is_rejected() {
        assert!(Message::new("m-1", "   ", "host-a", Utc::now()).is_err());
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = Message::new("   ", "hello", "host-a", Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldName { .. }));
    }

    #[test]
    fn generic_setter_rejects_reserved_names() {
        let mut msg = sample();
        let err = msg.set_field("source", FieldValue::from("x")).unwrap_err();
        assert!(matches!(err, Error::ReservedFieldName { .. }));
    }

    #[test]
    fn generic_setter_rejects_invalid_names() {
        let mut msg = sample();
        let err = msg.set_field("bad name!", FieldValue::from("x")).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldName { .. }));
    }

    #[test]
    fn empty_string_values_are_dropped() {
        let mut msg = sample();
        msg.set_field("testfield", FieldValue::from("v")).unwrap();
        assert!(msg.get_field("testfield").is_some());
        msg.set_field("testfield", FieldValue::from("")).unwrap();
        assert!(msg.get_field("testfield").is_none());
    }

    #[test]
    fn string_values_are_trimmed() {
        let mut msg = sample();
        msg.set_field("testfield", FieldValue::from("  v  ")).unwrap();
        assert_eq!(
            msg.get_field("testfield"),
            Some(&FieldValue::String("v".to_owned()))
        );
    }
}
