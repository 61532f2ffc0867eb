//! The immutable, field-indexed snapshot of the active rule set.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use regex::Regex;
use streamrouter_domain::constants::MAX_REGEX_PATTERN_LEN;
use streamrouter_domain::entities::{RuleKind, Stream, StreamRule};
use streamrouter_domain::matching;
use streamrouter_domain::value_objects::StreamId;

/// One rule, resolved against the field(s) it was bucketed under, ready
/// for evaluation against a specific message.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The stream this rule belongs to.
    pub stream_id: StreamId,
    /// The rule itself.
    pub rule: StreamRule,
    /// The rule's pre-compiled pattern, present only for [`RuleKind::Regex`].
    pub compiled_regex: Option<Regex>,
}

/// Outcome of an [`Engine::build`] call: how many streams were dropped and
/// how many rules ended up indexed, for the Engine Updater's metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    /// Streams excluded because one of their rules failed to compile.
    pub dropped_streams: usize,
    /// Total rules indexed across all eligible streams.
    pub indexed_rules: usize,
}

#[derive(Debug, Default)]
struct KindIndex {
    by_field: HashMap<String, Vec<StreamRule>>,
}

/// An immutable, field-indexed compilation of the catalogue's enabled,
/// non-quarantined streams.
///
/// Construction never fails: a stream whose regex rule fails to compile
/// is dropped in its entirety (fail-closed), logged, and counted in the
/// returned [`BuildStats`].
#[derive(Debug)]
pub struct Engine {
    fingerprint: u64,
    order: Vec<StreamId>,
    streams: HashMap<StreamId, Stream>,
    rule_counts: HashMap<StreamId, usize>,
    indices: HashMap<RuleKind, KindIndex>,
    compiled_regex: HashMap<String, Regex>,
    stats: BuildStats,
}

impl Engine {
    /// Builds a new engine from a catalogue snapshot.
    ///
    /// `quarantined` lists streams the Fault Manager has disabled; they
    /// are filtered out before indexing (and before the fingerprint is
    /// computed, so re-quarantining a stream always forces a rebuild).
    #[must_use]
    pub fn build(streams: Vec<Stream>, quarantined: &HashSet<StreamId>) -> (Self, BuildStats) {
        let filtered: Vec<Stream> = streams
            .into_iter()
            .filter(|s| s.enabled && !quarantined.contains(&s.id))
            .collect();
        let fingerprint = compute_fingerprint(&filtered);

        let mut order = Vec::with_capacity(filtered.len());
        let mut streams_by_id = HashMap::with_capacity(filtered.len());
        let mut rule_counts = HashMap::new();
        let mut indices: HashMap<RuleKind, KindIndex> = RuleKind::EVALUATION_ORDER
            .into_iter()
            .map(|kind| (kind, KindIndex::default()))
            .collect();
        let mut compiled_regex = HashMap::new();
        let mut stats = BuildStats::default();

        for stream in filtered {
            if stream.rules.is_empty() {
                // A stream with zero rules never matches; it is kept
                // around (for diagnostics) but never made eligible.
                order.push(stream.id.clone());
                streams_by_id.insert(stream.id.clone(), stream);
                continue;
            }

            match compile_regex_rules(&stream) {
                Ok(stream_regexes) => {
                    rule_counts.insert(stream.id.clone(), stream.rules.len());
                    stats.indexed_rules += stream.rules.len();
                    for rule in &stream.rules {
                        #[allow(clippy::unwrap_used)]
                        indices
                            .get_mut(&rule.kind)
                            .unwrap()
                            .by_field
                            .entry(rule.field.clone())
                            .or_default()
                            .push(rule.clone());
                    }
                    compiled_regex.extend(stream_regexes);
                    order.push(stream.id.clone());
                    streams_by_id.insert(stream.id.clone(), stream);
                }
                Err(message) => {
                    stats.dropped_streams += 1;
                    tracing::warn!(stream_id = %stream.id, %message, "dropping stream: regex rule failed to compile");
                }
            }
        }

        (
            Self {
                fingerprint,
                order,
                streams: streams_by_id,
                rule_counts,
                indices,
                compiled_regex,
                stats,
            },
            stats,
        )
    }

    /// The content fingerprint this engine was built from.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Build-time statistics (dropped streams, indexed rules).
    #[must_use]
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Total rule count required for `stream_id` to match; zero if the
    /// stream is unknown or has no rules (and therefore can never match).
    #[must_use]
    pub fn rule_count(&self, stream_id: &StreamId) -> usize {
        self.rule_counts.get(stream_id).copied().unwrap_or(0)
    }

    /// A previously-built stream's entity, if it survived indexing.
    #[must_use]
    pub fn stream(&self, stream_id: &StreamId) -> Option<&Stream> {
        self.streams.get(stream_id)
    }

    /// Builds the candidate rule list for `message`, in the evaluation
    /// order from §4.2: Presence (all known fields), then Exact, Greater,
    /// Smaller, Regex restricted to the intersection of the message's
    /// field set and each kind's indexed fields.
    #[must_use]
    pub fn candidates(&self, message: &streamrouter_domain::entities::Message) -> Vec<Candidate> {
        let field_names = message.field_names();
        let mut out = Vec::new();

        for kind in RuleKind::EVALUATION_ORDER {
            let Some(index) = self.indices.get(&kind) else {
                continue;
            };
            if matches!(kind, RuleKind::Presence) {
                for rules in index.by_field.values() {
                    for rule in rules {
                        out.push(self.candidate_for(rule));
                    }
                }
            } else {
                for field in &field_names {
                    if let Some(rules) = index.by_field.get(*field) {
                        for rule in rules {
                            out.push(self.candidate_for(rule));
                        }
                    }
                }
            }
        }
        out
    }

    fn candidate_for(&self, rule: &StreamRule) -> Candidate {
        let compiled_regex = if matches!(rule.kind, RuleKind::Regex) {
            self.compiled_regex.get(rule.id.as_str()).cloned()
        } else {
            None
        };
        Candidate {
            stream_id: rule.stream_id.clone(),
            rule: rule.clone(),
            compiled_regex,
        }
    }

    /// Routes `message` against every eligible stream in a single pass,
    /// with no per-rule timeout. Used directly by tests and by
    /// [`Engine::test_match`]; the Router façade instead drives
    /// [`Engine::candidates`] itself so each evaluation can go through the
    /// per-rule timeout harness.
    #[must_use]
    pub fn r#match(&self, message: &streamrouter_domain::entities::Message) -> Vec<Stream> {
        let mut tally: HashMap<StreamId, usize> = HashMap::new();
        for candidate in self.candidates(message) {
            if matching::evaluate(message, &candidate.rule, candidate.compiled_regex.as_ref()) {
                *tally.entry(candidate.stream_id).or_insert(0) += 1;
            }
        }
        self.resolve_tally(&tally)
    }

    /// Resolves a per-stream match tally (how many of its rules matched)
    /// into the list of fully-matched streams, in catalogue order.
    ///
    /// Shared by [`Engine::match`] and the Router façade, which builds
    /// its own tally under the per-rule timeout harness.
    #[must_use]
    pub fn resolve_tally(&self, tally: &HashMap<StreamId, usize>) -> Vec<Stream> {
        self.order
            .iter()
            .filter(|id| {
                let required = self.rule_count(id);
                required > 0 && tally.get(*id).copied().unwrap_or(0) == required
            })
            .filter_map(|id| self.streams.get(id).cloned())
            .collect()
    }

    /// Diagnostic variant of [`Engine::match`]: for every stream that had
    /// at least one candidate rule, returns the stream alongside each of
    /// its rules' individual outcome.
    #[must_use]
    pub fn test_match(
        &self,
        message: &streamrouter_domain::entities::Message,
    ) -> Vec<(Stream, Vec<(StreamRule, bool)>)> {
        let mut per_stream: HashMap<StreamId, Vec<(StreamRule, bool)>> = HashMap::new();
        for candidate in self.candidates(message) {
            let outcome =
                matching::evaluate(message, &candidate.rule, candidate.compiled_regex.as_ref());
            per_stream
                .entry(candidate.stream_id)
                .or_default()
                .push((candidate.rule, outcome));
        }

        self.order
            .iter()
            .filter_map(|id| {
                let results = per_stream.remove(id)?;
                let stream = self.streams.get(id)?.clone();
                Some((stream, results))
            })
            .collect()
    }
}

fn compile_regex_rules(stream: &Stream) -> Result<Vec<(String, Regex)>, String> {
    let mut compiled = Vec::new();
    for rule in &stream.rules {
        if !matches!(rule.kind, RuleKind::Regex) {
            continue;
        }
        let Some(pattern) = &rule.value else {
            return Err(format!("rule {} has no regex pattern", rule.id));
        };
        if pattern.len() > MAX_REGEX_PATTERN_LEN {
            return Err(format!(
                "rule {} pattern exceeds {MAX_REGEX_PATTERN_LEN} bytes",
                rule.id
            ));
        }
        match Regex::new(pattern) {
            Ok(re) => compiled.push((rule.id.to_string(), re)),
            Err(err) => return Err(format!("rule {}: {err}", rule.id)),
        }
    }
    Ok(compiled)
}

/// Stable hash over the sorted `(stream_id, rule_id, kind, field, value,
/// inverted)` tuples of every stream considered for a build — computed
/// before regex validation so a dropped stream still participates.
fn compute_fingerprint(streams: &[Stream]) -> u64 {
    let mut tuples: Vec<(String, String, u8, String, String, bool)> = Vec::new();
    for stream in streams {
        for rule in &stream.rules {
            tuples.push((
                stream.id.to_string(),
                rule.id.to_string(),
                kind_tag(rule.kind),
                rule.field.clone(),
                rule.value.clone().unwrap_or_default(),
                rule.inverted,
            ));
        }
    }
    tuples.sort();

    let mut hasher = DefaultHasher::new();
    tuples.hash(&mut hasher);
    hasher.finish()
}

fn kind_tag(kind: RuleKind) -> u8 {
    match kind {
        RuleKind::Presence => 0,
        RuleKind::Exact => 1,
        RuleKind::Greater => 2,
        RuleKind::Smaller => 3,
        RuleKind::Regex => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use streamrouter_domain::entities::Message;
    use streamrouter_domain::value_objects::FieldValue;

    fn msg(fields: &[(&str, &str)]) -> Message {
        #[allow(clippy::unwrap_used)]
        let mut m = Message::new("m-1", "body", "host", Utc::now()).unwrap();
        for (k, v) in fields {
            m.set_field(*k, FieldValue::from(*v)).unwrap();
        }
        m
    }

    fn build(streams: Vec<Stream>) -> Engine {
        Engine::build(streams, &HashSet::new()).0
    }

    #[test]
    fn empty_rule_stream_never_matches() {
        let stream = Stream::new("s1", "empty");
        let engine = build(vec![stream]);
        assert!(engine.r#match(&msg(&[])).is_empty());
    }

    #[test]
    fn conjunction_requires_every_rule() {
        let stream = Stream::new("s1", "t")
            .with_rule(StreamRule::new(
                "r1",
                "s1",
                RuleKind::Presence,
                "f1",
                None,
            ))
            .with_rule(StreamRule::new(
                "r2",
                "s1",
                RuleKind::Regex,
                "f2",
                Some("^test".to_owned()),
            ));
        let engine = build(vec![stream]);

        assert!(engine.r#match(&msg(&[])).is_empty());
        assert!(engine.r#match(&msg(&[("f1", "x"), ("f2", "xv")])).is_empty());
        let matched = engine.r#match(&msg(&[("f1", "x"), ("f2", "testx")]));
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id.as_str(), "s1");
    }

    #[test]
    fn multi_stream_disjunction_returns_all_matching() {
        let s1 = Stream::new("s1", "t1")
            .with_rule(StreamRule::new("r1", "s1", RuleKind::Presence, "f1", None))
            .with_rule(StreamRule::new(
                "r2",
                "s1",
                RuleKind::Regex,
                "f2",
                Some("^test".to_owned()),
            ));
        let s2 = Stream::new("s2", "t2").with_rule(StreamRule::new(
            "r3",
            "s2",
            RuleKind::Exact,
            "f3",
            Some("v3".to_owned()),
        ));
        let engine = build(vec![s1, s2]);

        let both = engine.r#match(&msg(&[("f1", "x"), ("f2", "testx"), ("f3", "v3")]));
        let ids: HashSet<_> = both.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, HashSet::from(["s1", "s2"]));

        let only_s2 = engine.r#match(&msg(&[("f3", "v3")]));
        assert_eq!(only_s2.len(), 1);
        assert_eq!(only_s2[0].id.as_str(), "s2");
    }

    #[test]
    fn invalid_regex_drops_the_whole_stream() {
        let stream = Stream::new("s1", "t").with_rule(StreamRule::new(
            "r1",
            "s1",
            RuleKind::Regex,
            "f1",
            Some("(".to_owned()),
        ));
        let (engine, stats) = Engine::build(vec![stream], &HashSet::new());
        assert_eq!(stats.dropped_streams, 1);
        assert_eq!(engine.rule_count(&StreamId::from("s1")), 0);
    }

    #[test]
    fn quarantined_streams_are_excluded_from_the_build() {
        let stream = Stream::new("s1", "t").with_rule(StreamRule::new(
            "r1", "s1", RuleKind::Presence, "f1", None,
        ));
        let mut quarantined = HashSet::new();
        quarantined.insert(StreamId::from("s1"));
        let (engine, _) = Engine::build(vec![stream], &quarantined);
        assert_eq!(engine.rule_count(&StreamId::from("s1")), 0);
    }

    #[test]
    fn fingerprint_is_stable_for_identical_catalogues() {
        let build_streams = || {
            vec![
                Stream::new("s1", "t").with_rule(StreamRule::new(
                    "r1",
                    "s1",
                    RuleKind::Presence,
                    "f1",
                    None,
                )),
            ]
        };
        let e1 = build(build_streams());
        let e2 = build(build_streams());
        assert_eq!(e1.fingerprint(), e2.fingerprint());
    }

    #[test]
    fn fingerprint_changes_when_quarantine_changes() {
        let stream = || {
            Stream::new("s1", "t").with_rule(StreamRule::new(
                "r1", "s1", RuleKind::Presence, "f1", None,
            ))
        };
        let (no_quarantine, _) = Engine::build(vec![stream()], &HashSet::new());
        let mut quarantined = HashSet::new();
        quarantined.insert(StreamId::from("s1"));
        let (quarantined_engine, _) = Engine::build(vec![stream()], &quarantined);
        assert_ne!(no_quarantine.fingerprint(), quarantined_engine.fingerprint());
    }

    #[test]
    fn test_match_reports_per_rule_outcomes() {
        let stream = Stream::new("s1", "t")
            .with_rule(StreamRule::new("r1", "s1", RuleKind::Presence, "f1", None))
            .with_rule(StreamRule::new(
                "r2",
                "s1",
                RuleKind::Exact,
                "f2",
                Some("v".to_owned()),
            ));
        let engine = build(vec![stream]);
        let results = engine.test_match(&msg(&[("f1", "x")]));
        assert_eq!(results.len(), 1);
        let (stream, outcomes) = &results[0];
        assert_eq!(stream.id.as_str(), "s1");
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().any(|(r, ok)| r.id.as_str() == "r1" && *ok));
        assert!(outcomes.iter().any(|(r, ok)| r.id.as_str() == "r2" && !*ok));
    }
}
