//! Rule matchers: one pure function per [`RuleKind`], each `(message, rule) -> bool`.
//!
//! Every matcher here is total — it never panics and never performs I/O —
//! so it can be invoked concurrently against a shared, immutable engine.
//! Numeric coercion failures resolve to `false` rather than propagating an
//! error; the surrounding harness ([`streamrouter_application`]) is
//! responsible for timeouts and fault accounting, not this module.

use regex::Regex;

use crate::entities::{Message, RuleKind, StreamRule};

/// Evaluates `rule` against `message`, dispatching on [`StreamRule::kind`].
///
/// For [`RuleKind::Regex`], `compiled` must hold the rule's pre-compiled
/// pattern (built once at engine construction); passing `None` for a
/// regex rule always yields `false`, matching the "rule dropped at build
/// time" behaviour for an uncompilable pattern.
#[must_use]
pub fn evaluate(message: &Message, rule: &StreamRule, compiled: Option<&Regex>) -> bool {
    let raw = match rule.kind {
        RuleKind::Presence => matches_presence(message, rule),
        RuleKind::Exact => matches_exact(message, rule),
        RuleKind::Greater => matches_greater(message, rule),
        RuleKind::Smaller => matches_smaller(message, rule),
        RuleKind::Regex => compiled.is_some_and(|re| matches_regex(message, rule, re)),
    };
    if rule.inverted { !raw } else { raw }
}

/// True iff the field exists on `message` and its string form is non-empty.
#[must_use]
pub fn matches_presence(message: &Message, rule: &StreamRule) -> bool {
    message
        .get_field(&rule.field)
        .is_some_and(crate::value_objects::FieldValue::is_present)
}

/// True iff the field's string form equals `rule.value` octet-for-octet.
#[must_use]
pub fn matches_exact(message: &Message, rule: &StreamRule) -> bool {
    let Some(expected) = &rule.value else {
        return false;
    };
    message
        .get_field(&rule.field)
        .is_some_and(|v| v.as_match_string() == *expected)
}

/// True iff the field, parsed as `f64`, is greater than `rule.value`.
///
/// A parse failure on either side resolves to `false`.
#[must_use]
pub fn matches_greater(message: &Message, rule: &StreamRule) -> bool {
    numeric_compare(message, rule).is_some_and(|(lhs, rhs)| lhs > rhs)
}

/// True iff the field, parsed as `f64`, is smaller than `rule.value`.
///
/// A parse failure on either side resolves to `false`.
#[must_use]
pub fn matches_smaller(message: &Message, rule: &StreamRule) -> bool {
    numeric_compare(message, rule).is_some_and(|(lhs, rhs)| lhs < rhs)
}

fn numeric_compare(message: &Message, rule: &StreamRule) -> Option<(f64, f64)> {
    let rhs = rule.value.as_ref()?.trim().parse::<f64>().ok()?;
    let lhs = message.get_field(&rule.field)?.as_f64()?;
    Some((lhs, rhs))
}

/// True iff `compiled` finds a match anywhere in the field's string form.
#[must_use]
pub fn matches_regex(message: &Message, rule: &StreamRule, compiled: &Regex) -> bool {
    message
        .get_field(&rule.field)
        .is_some_and(|v| compiled.is_match(&v.as_match_string()))
}
