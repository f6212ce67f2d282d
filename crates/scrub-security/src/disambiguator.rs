//! Candidate filtering, overlap resolution and merging
//!
//! Turns the raw candidate list of a [`crate::Detection`] into the sorted,
//! non-overlapping spans the [`crate::SpanRedactor`] expects. A name the
//! recognizer confirms once is confirmed at every other whole-word occurrence
//! in the same text, whatever its case.

use std::collections::HashMap;
use std::sync::Arc;

use scrub_core::{NameSpan, SpanSource};
use tracing::trace;

use crate::exclusions::{ExclusionRule, ExclusionTable};
use crate::lexicon::{is_modal, is_subject_pronoun};
use crate::roster::RosterIndex;
use crate::text::normalize;
use crate::tokenize::{Token, is_capitalized, is_horizontal_gap};

pub struct Disambiguator {
    roster: Arc<RosterIndex>,
    exclusions: Arc<ExclusionTable>,
    min_ner_confidence: f32,
}

impl Disambiguator {
    pub fn new(
        roster: Arc<RosterIndex>,
        exclusions: Arc<ExclusionTable>,
        min_ner_confidence: f32,
    ) -> Self {
        Self {
            roster,
            exclusions,
            min_ner_confidence,
        }
    }

    /// Confirm candidates and return sorted, non-overlapping spans
    ///
    /// `candidates` must be ordered by start. `tokens` are the words of
    /// `text` outside the `protected` placeholder ranges.
    pub fn resolve(
        &self,
        text: &str,
        tokens: &[Token],
        protected: &[(usize, usize)],
        candidates: &[NameSpan],
    ) -> Vec<NameSpan> {
        let starts: HashMap<usize, usize> =
            tokens.iter().enumerate().map(|(i, t)| (t.start, i)).collect();
        let ends: HashMap<usize, usize> =
            tokens.iter().enumerate().map(|(i, t)| (t.end, i)).collect();

        let mut kept: Vec<NameSpan> = Vec::new();
        for candidate in candidates {
            if protected
                .iter()
                .any(|&(start, end)| candidate.overlaps_range(start, end))
            {
                trace!(start = candidate.start, "Candidate overlaps a placeholder");
                continue;
            }

            // Spans must cover whole words
            let (Some(&first), Some(&last)) =
                (starts.get(&candidate.start), ends.get(&candidate.end))
            else {
                trace!(start = candidate.start, "Candidate is not word aligned");
                continue;
            };
            if first > last {
                continue;
            }

            if let Some(span) = self.confirm(text, tokens, first, last, candidate, &kept) {
                kept.push(span);
            }
        }

        let mut spans = resolve_overlaps(kept);
        let repeats = self.repeats(text, tokens, &starts, &ends, &spans);
        if !repeats.is_empty() {
            spans.extend(repeats);
            spans = resolve_overlaps(spans);
        }
        merge_adjacent(text, spans)
    }

    /// Further occurrences of recognizer-confirmed names
    ///
    /// Roster names need no such pass; the roster scan already finds every
    /// occurrence.
    fn repeats(
        &self,
        text: &str,
        tokens: &[Token],
        starts: &HashMap<usize, usize>,
        ends: &HashMap<usize, usize>,
        spans: &[NameSpan],
    ) -> Vec<NameSpan> {
        let words: Vec<String> = tokens.iter().map(|t| normalize(t.as_str(text))).collect();

        let mut names: Vec<(&[String], f32)> = Vec::new();
        for span in spans.iter().filter(|s| s.source == SpanSource::Ner) {
            let (Some(&first), Some(&last)) = (starts.get(&span.start), ends.get(&span.end))
            else {
                continue;
            };
            let name = &words[first..=last];
            if !names.iter().any(|(known, _)| *known == name) {
                names.push((name, span.confidence));
            }
        }

        let mut found = Vec::new();
        for (name, confidence) in names {
            for first in 0..=words.len().saturating_sub(name.len()) {
                let last = first + name.len() - 1;
                if last >= words.len() || words[first..=last] != *name {
                    continue;
                }
                let linked = tokens[first..=last]
                    .windows(2)
                    .all(|pair| is_horizontal_gap(text, pair[0].end, pair[1].start));
                let (start, end) = (tokens[first].start, tokens[last].end);
                if !linked || spans.iter().any(|s| s.start == start && s.end == end) {
                    continue;
                }

                let Some(candidate) = NameSpan::new(text, start, end, SpanSource::Ner, confidence)
                else {
                    continue;
                };
                if let Some(span) = self.confirm(text, tokens, first, last, &candidate, spans) {
                    trace!(start, "Repeated name confirmed");
                    found.push(span);
                }
            }
        }

        found
    }

    fn confirm(
        &self,
        text: &str,
        tokens: &[Token],
        first: usize,
        last: usize,
        candidate: &NameSpan,
        kept: &[NameSpan],
    ) -> Option<NameSpan> {
        let normalized = normalize(&candidate.surface);
        let roster_confirmed =
            candidate.source == SpanSource::RosterExact || self.roster.contains(&normalized);
        let capitalized = is_capitalized(&candidate.surface);
        let single = first == last;

        if single {
            let allowed = match self.exclusions.rule_for(&normalized) {
                Some(ExclusionRule::RosterOnly) => roster_confirmed,
                Some(ExclusionRule::CapitalizedRoster) => roster_confirmed && capitalized,
                None => true,
            };
            if !allowed {
                trace!(start = candidate.start, "Common word excluded");
                return None;
            }
        }

        let exempt = roster_confirmed && (capitalized || !single);
        if !exempt && modal_context(text, tokens, first, last, kept) {
            trace!(start = candidate.start, "Candidate reads as a modal construction");
            return None;
        }

        if !roster_confirmed && candidate.confidence < self.min_ner_confidence {
            return None;
        }

        let (source, confidence) = if roster_confirmed {
            (SpanSource::RosterExact, 1.0)
        } else {
            (candidate.source, candidate.confidence)
        };
        Some(NameSpan {
            source,
            confidence,
            ..candidate.clone()
        })
    }
}

/// "Will you ..." or "... can park ..." around the candidate's words
fn modal_context(
    text: &str,
    tokens: &[Token],
    first: usize,
    last: usize,
    kept: &[NameSpan],
) -> bool {
    let own = normalize(tokens[first].as_str(text));
    if first == last && is_modal(&own) {
        if let Some(next) = tokens.get(first + 1) {
            if is_horizontal_gap(text, tokens[first].end, next.start)
                && is_subject_pronoun(&normalize(next.as_str(text)))
            {
                return true;
            }
        }
    }

    let Some(prev) = first.checked_sub(1).map(|i| tokens[i]) else {
        return false;
    };
    is_horizontal_gap(text, prev.end, tokens[first].start)
        && is_modal(&normalize(prev.as_str(text)))
        && !kept.iter().any(|s| s.overlaps_range(prev.start, prev.end))
}

/// Join spans separated only by spaces or tabs
///
/// Input must be ordered by start and free of overlaps.
fn merge_adjacent(text: &str, spans: Vec<NameSpan>) -> Vec<NameSpan> {
    let mut merged: Vec<NameSpan> = Vec::with_capacity(spans.len());

    for span in spans {
        if let Some(prev) = merged.last_mut() {
            if !prev.overlaps(&span) && is_horizontal_gap(text, prev.end, span.start) {
                if let Some(joined) = NameSpan::new(
                    text,
                    prev.start,
                    span.end,
                    merged_source(prev.source, span.source),
                    prev.confidence.max(span.confidence),
                ) {
                    *prev = joined;
                    continue;
                }
            }
        }
        merged.push(span);
    }

    merged
}

fn merged_source(a: SpanSource, b: SpanSource) -> SpanSource {
    if a == SpanSource::RosterExact || b == SpanSource::RosterExact {
        SpanSource::RosterExact
    } else {
        SpanSource::Ner
    }
}

/// Keep the longest of overlapping spans; ties go to the earlier start
fn resolve_overlaps(mut spans: Vec<NameSpan>) -> Vec<NameSpan> {
    spans.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then(a.start.cmp(&b.start))
            .then(b.confidence.total_cmp(&a.confidence))
    });

    let mut accepted: Vec<NameSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if !accepted.iter().any(|a| a.overlaps(&span)) {
            accepted.push(span);
        }
    }

    accepted.sort_by_key(|s| s.start);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::HeuristicRecognizer;
    use crate::text::placeholder_ranges;
    use crate::tokenize::tokenize;

    fn resolve_spans(roster: &[&str], text: &str) -> Vec<NameSpan> {
        let roster = Arc::new(RosterIndex::from_names(roster));
        let protected = placeholder_ranges(text, "[NAME]");
        let tokens: Vec<Token> = tokenize(text)
            .into_iter()
            .filter(|t| !t.is_within(&protected))
            .collect();

        let mut candidates = roster.scan(text, &tokens);
        candidates.extend(HeuristicRecognizer::new("[NAME]").scan(text));
        candidates.sort_by_key(|c| (c.start, std::cmp::Reverse(c.end)));

        Disambiguator::new(roster, Arc::new(ExclusionTable::builtin()), 0.85)
            .resolve(text, &tokens, &protected, &candidates)
    }

    fn resolve(roster: &[&str], text: &str) -> Vec<String> {
        resolve_spans(roster, text)
            .into_iter()
            .map(|s| s.surface)
            .collect()
    }

    fn ner(text: &str, start: usize, end: usize, confidence: f32) -> NameSpan {
        NameSpan::new(text, start, end, SpanSource::Ner, confidence).unwrap()
    }

    #[test]
    fn test_modal_with_pronoun_is_not_a_name() {
        let roster = ["Sarah Johnson"];
        assert!(resolve(&roster, "Will you help me with this?").is_empty());
        assert!(resolve(&roster, "May I ask a question?").is_empty());
        assert_eq!(resolve(&roster, "Hey Sarah, will you help?"), vec!["Sarah"]);
    }

    #[test]
    fn test_roster_words_that_are_common_words() {
        let roster = ["Prof. Grace Kim"];
        assert_eq!(
            resolve(&roster, "By grace of the deadline, Grace Kim replied."),
            vec!["grace", "Grace Kim"]
        );
        assert_eq!(resolve(&roster, "Ask Grace."), vec!["Grace"]);
        assert_eq!(resolve(&roster, "I asked grace about it"), vec!["grace"]);
        assert!(resolve(&[], "a little grace period, Prof. Grace").is_empty());
    }

    #[test]
    fn test_auxiliary_roster_names_need_capitals() {
        let roster = ["Will Johnson"];
        assert!(resolve(&roster, "I will help").is_empty());
        assert_eq!(resolve(&roster, "Ask Will."), vec!["Will"]);
        assert_eq!(resolve(&roster, "ask will johnson"), vec!["will johnson"]);
    }

    #[test]
    fn test_preceding_modal_drops_lowercase_roster_word() {
        let roster = ["Sue Park"];
        assert!(resolve(&roster, "you can park behind the lab").is_empty());
        assert_eq!(resolve(&roster, "thanks to park for the tip"), vec!["park"]);
    }

    #[test]
    fn test_overlap_resolution_keeps_adjacent_roster_words() {
        let roster = ["Sarah Johnson", "Sue Park"];
        assert_eq!(
            resolve(&roster, "Sarah, Bob Johnson park"),
            vec!["Sarah", "Bob Johnson park"]
        );
        assert_eq!(
            resolve(&roster, "Sarah, Will\tJohnson park"),
            vec!["Sarah", "Johnson\tpark"]
        );
    }

    #[test]
    fn test_recognized_names_repeat_case_insensitively() {
        assert_eq!(
            resolve(&[], "Thanks Prof. Kim. Kim was great and kim agreed"),
            vec!["Kim", "Kim", "kim"]
        );
        assert_eq!(
            resolve(&[], "I met Alan Turing today; later alan turing left"),
            vec!["Alan Turing", "alan turing"]
        );
        // Repeats still honour the modal context rule
        assert_eq!(resolve(&[], "Ask Prof. Kim if you can kim"), vec!["Kim"]);
    }

    #[test]
    fn test_adjacent_roster_words_merge() {
        let spans = resolve_spans(&["Jane Austen", "John Doe"], "met jane doe today");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].surface, "jane doe");
        assert_eq!(spans[0].source, SpanSource::RosterExact);
        assert_eq!(spans[0].confidence, 1.0);
    }

    #[test]
    fn test_full_name_wins_over_parts() {
        let spans = resolve_spans(&["John Smith"], "I asked John Smith and Smith replied");
        let surfaces: Vec<&str> = spans.iter().map(|s| s.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["John Smith", "Smith"]);
        assert!(spans.windows(2).all(|w| w[0].end <= w[1].start));
    }

    #[test]
    fn test_confidence_gate() {
        assert!(resolve(&[], "I asked Jerry about it").is_empty());
        assert_eq!(resolve(&[], "I worked with Alan Turing today"), vec!["Alan Turing"]);
        assert_eq!(resolve(&[], "Great! Prof. Kim will be happy."), vec!["Kim"]);
    }

    #[test]
    fn test_overlap_tie_goes_to_earlier_start() {
        let text = "Ann Lee Bob";
        let tokens = tokenize(text);
        let candidates = vec![ner(text, 0, 7, 0.9), ner(text, 4, 11, 0.9)];
        let spans = Disambiguator::new(
            Arc::new(RosterIndex::empty()),
            Arc::new(ExclusionTable::builtin()),
            0.85,
        )
        .resolve(text, &tokens, &[], &candidates);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].surface, "Ann Lee");
    }

    #[test]
    fn test_placeholder_and_misaligned_candidates_are_dropped() {
        let text = "[NAME] met Bobby";
        let protected = placeholder_ranges(text, "[NAME]");
        let tokens: Vec<Token> = tokenize(text)
            .into_iter()
            .filter(|t| !t.is_within(&protected))
            .collect();
        let candidates = vec![ner(text, 0, 6, 0.99), ner(text, 11, 14, 0.99)];
        let spans = Disambiguator::new(
            Arc::new(RosterIndex::empty()),
            Arc::new(ExclusionTable::builtin()),
            0.85,
        )
        .resolve(text, &tokens, &protected, &candidates);

        assert!(spans.is_empty());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let roster = ["Sarah Johnson", "John Smith"];
        let text = "Sarah Johnson and John Smith met Alan Turing.";
        assert_eq!(resolve(&roster, text), resolve(&roster, text));
        assert_eq!(
            resolve(&roster, text),
            vec!["Sarah Johnson", "John Smith", "Alan Turing"]
        );
    }
}
