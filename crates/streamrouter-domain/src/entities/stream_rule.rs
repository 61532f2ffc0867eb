//! One predicate on one field, tagged by kind.

use serde::{Deserialize, Serialize};

use crate::value_objects::{RuleId, StreamId};

/// The kind of predicate a [`StreamRule`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// The field exists and its string form is non-empty.
    Presence,
    /// The field's string form equals the rule's value octet-for-octet.
    Exact,
    /// The field, parsed as a double, is greater than the rule's value.
    Greater,
    /// The field, parsed as a double, is smaller than the rule's value.
    Smaller,
    /// The field's string form matches the rule's compiled regex.
    Regex,
}

impl RuleKind {
    /// The kinds in evaluation order: cheap structural checks before the
    /// more expensive numeric and regex comparisons.
    pub const EVALUATION_ORDER: [RuleKind; 5] = [
        RuleKind::Presence,
        RuleKind::Exact,
        RuleKind::Greater,
        RuleKind::Smaller,
        RuleKind::Regex,
    ];
}

/// One predicate on one field, owned by a [`crate::entities::Stream`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRule {
    /// Unique id of this rule.
    pub id: RuleId,
    /// The stream this rule belongs to.
    pub stream_id: StreamId,
    /// The predicate kind.
    pub kind: RuleKind,
    /// The message field this rule inspects.
    pub field: String,
    /// The literal comparison value. Ignored for [`RuleKind::Presence`].
    pub value: Option<String>,
    /// When set, the matcher's boolean outcome is negated.
    pub inverted: bool,
}

impl StreamRule {
    /// Convenience constructor for a non-inverted rule.
    #[must_use]
    pub fn new(
        id: impl Into<RuleId>,
        stream_id: impl Into<StreamId>,
        kind: RuleKind,
        field: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            kind,
            field: field.into(),
            value,
            inverted: false,
        }
    }

    /// Returns this rule with its inversion flag set.
    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }
}
