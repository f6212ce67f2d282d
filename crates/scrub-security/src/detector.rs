//! Name candidate detection
//!
//! Combines a pluggable [`EntityRecognizer`] with a roster scan. The
//! recognizer is the only slow, fallible step: it runs under a timeout and
//! any failure degrades to roster-only candidates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scrub_core::{Error, NameSpan, Result, SpanSource};
use tracing::{debug, warn};

use crate::lexicon::{is_function_word, is_honorific, is_modal, is_particle};
use crate::roster::RosterIndex;
use crate::text::{clean_text, normalize, placeholder_ranges};
use crate::tokenize::{Token, is_capitalized, is_horizontal_gap, tokenize};

/// Statistical recognizer restricted to person names
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Person-name spans in `text`, offsets into `text`
    async fn recognize(&self, text: &str) -> Result<Vec<NameSpan>>;
}

/// Confidence for a run right after an honorific ("Prof. Kim")
pub const HONORIFIC_CONFIDENCE: f32 = 0.95;
/// Two or more capitalized words mid-sentence
pub const RUN_CONFIDENCE: f32 = 0.90;
/// Two or more capitalized words opening a sentence
pub const SENTENCE_START_RUN_CONFIDENCE: f32 = 0.85;
/// One capitalized word mid-sentence
pub const WORD_CONFIDENCE: f32 = 0.60;
/// One capitalized word opening a sentence, or a run touching a placeholder
pub const LOW_CONFIDENCE: f32 = 0.30;

/// Capitalization-based recognizer bundled with the engine
///
/// Scores runs of capitalized words by position. Runs stop at placeholders,
/// and a run touching a placeholder gets [`LOW_CONFIDENCE`] even after an
/// honorific, so text that was already redacted never scores higher than it
/// did the first time.
pub struct HeuristicRecognizer {
    placeholder: String,
}

impl HeuristicRecognizer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    pub fn scan(&self, text: &str) -> Vec<NameSpan> {
        let protected = placeholder_ranges(text, &self.placeholder);
        let tokens: Vec<Token> = tokenize(text)
            .into_iter()
            .filter(|t| !t.is_within(&protected))
            .collect();

        let mut spans = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if !is_name_word(tokens[i].as_str(text)) {
                i += 1;
                continue;
            }

            let (last, count) = extend_run(text, &tokens, i);
            let start = tokens[i].start;
            let end = tokens[last].end;
            let confidence = self.score(text, &tokens, &protected, i, start, end, count);
            if let Some(span) = NameSpan::new(text, start, end, SpanSource::Ner, confidence) {
                spans.push(span);
            }
            i = last + 1;
        }

        spans
    }

    #[allow(clippy::too_many_arguments)]
    fn score(
        &self,
        text: &str,
        tokens: &[Token],
        protected: &[(usize, usize)],
        first: usize,
        start: usize,
        end: usize,
        count: usize,
    ) -> f32 {
        if touches_placeholder(text, protected, start, end) {
            return LOW_CONFIDENCE;
        }
        if follows_honorific(text, tokens, first) {
            return HONORIFIC_CONFIDENCE;
        }
        match (count > 1, starts_sentence(text, start)) {
            (true, false) => RUN_CONFIDENCE,
            (true, true) => SENTENCE_START_RUN_CONFIDENCE,
            (false, false) => WORD_CONFIDENCE,
            (false, true) => LOW_CONFIDENCE,
        }
    }
}

#[async_trait]
impl EntityRecognizer for HeuristicRecognizer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn recognize(&self, text: &str) -> Result<Vec<NameSpan>> {
        Ok(self.scan(text))
    }
}

/// Index of the last word in the run starting at `first`, and its word count
///
/// Lowercase particles may sit inside a run when a capitalized word follows
/// them ("Maria de la Cruz").
fn extend_run(text: &str, tokens: &[Token], first: usize) -> (usize, usize) {
    let mut last = first;
    let mut count = 1;

    loop {
        let mut next = last + 1;
        while next < tokens.len()
            && is_horizontal_gap(text, tokens[next - 1].end, tokens[next].start)
            && is_particle(tokens[next].as_str(text))
        {
            next += 1;
        }

        let linked = next < tokens.len()
            && is_horizontal_gap(text, tokens[next - 1].end, tokens[next].start)
            && is_name_word(tokens[next].as_str(text));
        if !linked {
            return (last, count);
        }
        last = next;
        count += 1;
    }
}

/// Capitalized alphabetic word that could be part of a name
///
/// Modals never join a run, so "Could Alan Turing ..." yields "Alan Turing".
fn is_name_word(word: &str) -> bool {
    if word.chars().count() < 2 || !is_capitalized(word) {
        return false;
    }
    let word_char = |c: char| {
        c.is_alphabetic()
            || matches!(c, '-' | '\'' | '\u{2010}' | '\u{2019}')
            || unicode_normalization::char::is_combining_mark(c)
    };
    if !word.chars().all(word_char) {
        return false;
    }

    // Acronyms such as TA or CS
    if word.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase) {
        return false;
    }

    let normalized = normalize(word);
    !is_function_word(&normalized) && !is_honorific(&normalized) && !is_modal(&normalized)
}

fn follows_honorific(text: &str, tokens: &[Token], first: usize) -> bool {
    let Some(prev) = first.checked_sub(1).map(|i| tokens[i]) else {
        return false;
    };
    if !is_honorific(&normalize(prev.as_str(text))) {
        return false;
    }
    text.get(prev.end..tokens[first].start).is_some_and(|gap| {
        let rest = gap.strip_prefix('.').unwrap_or(gap);
        !rest.is_empty() && rest.chars().all(|c| c == ' ' || c == '\t')
    })
}

/// A placeholder sits next to the run, separated at most by spaces, tabs and
/// surname particles
fn touches_placeholder(text: &str, protected: &[(usize, usize)], start: usize, end: usize) -> bool {
    protected.iter().any(|&(p_start, p_end)| {
        (p_end <= start && is_linking_gap(text, p_end, start))
            || (end <= p_start && is_linking_gap(text, end, p_start))
    })
}

fn is_linking_gap(text: &str, from: usize, to: usize) -> bool {
    text.get(from..to).is_some_and(|gap| {
        !gap.contains(['\n', '\r'])
            && gap.split([' ', '\t']).all(|word| word.is_empty() || is_particle(&normalize(word)))
    })
}

fn starts_sentence(text: &str, start: usize) -> bool {
    let before = text.get(..start).unwrap_or_default();
    let trimmed = before.trim_end();
    if trimmed.len() < before.len() && before[trimmed.len()..].contains('\n') {
        return true;
    }

    let trimmed = trimmed
        .trim_end_matches(['(', '"', '\'', '\u{201C}', '\u{2018}'])
        .trim_end();
    match trimmed.chars().last() {
        None => true,
        Some(c) => matches!(c, '.' | '!' | '?' | ':'),
    }
}

/// Cleaned text plus every candidate name found in it
#[derive(Debug, Clone)]
pub struct Detection {
    /// Decoded text; all offsets below refer to it
    pub text: String,
    /// Words outside placeholder occurrences
    pub tokens: Vec<Token>,
    /// Placeholder occurrences
    pub protected: Vec<(usize, usize)>,
    /// Candidates ordered by start, longest first on ties
    pub candidates: Vec<NameSpan>,
    /// The recognizer failed and only roster matches are present
    pub degraded: bool,
}

pub struct NameDetector {
    recognizer: Arc<dyn EntityRecognizer>,
    roster: Arc<RosterIndex>,
    placeholder: String,
    timeout: Duration,
    collapse_whitespace: bool,
}

impl NameDetector {
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        roster: Arc<RosterIndex>,
        placeholder: impl Into<String>,
        timeout: Duration,
        collapse_whitespace: bool,
    ) -> Self {
        Self {
            recognizer,
            roster,
            placeholder: placeholder.into(),
            timeout,
            collapse_whitespace,
        }
    }

    /// Clean `raw` and collect name candidates over the cleaned text
    pub async fn detect(&self, raw: &str) -> Detection {
        let text = clean_text(raw, self.collapse_whitespace);
        let protected = placeholder_ranges(&text, &self.placeholder);
        let tokens: Vec<Token> = tokenize(&text)
            .into_iter()
            .filter(|t| !t.is_within(&protected))
            .collect();

        let mut candidates = self.roster.scan(&text, &tokens);
        let mut degraded = false;

        if !tokens.is_empty() {
            match self.recognize(&text).await {
                Ok(spans) => {
                    let total = spans.len();
                    let valid: Vec<NameSpan> = spans
                        .into_iter()
                        .filter_map(|s| {
                            let confidence = s.confidence.clamp(0.0, 1.0);
                            NameSpan::new(&text, s.start, s.end, SpanSource::Ner, confidence)
                        })
                        .collect();
                    if valid.len() < total {
                        debug!("Dropped {} recognizer spans outside the text", total - valid.len());
                    }
                    candidates.extend(valid);
                }
                Err(err) => {
                    warn!("{}; continuing with roster matches only", err);
                    degraded = true;
                }
            }
        }

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(source_rank(a.source).cmp(&source_rank(b.source)))
        });

        Detection {
            text,
            tokens,
            protected,
            candidates,
            degraded,
        }
    }

    async fn recognize(&self, text: &str) -> Result<Vec<NameSpan>> {
        match tokio::time::timeout(self.timeout, self.recognizer.recognize(text)).await {
            Ok(Ok(spans)) => Ok(spans),
            Ok(Err(err)) => Err(Error::ModelUnavailable(format!(
                "recognizer '{}' failed: {}",
                self.recognizer.name(),
                err
            ))),
            Err(_) => Err(Error::ModelUnavailable(format!(
                "recognizer '{}' timed out after {:?}",
                self.recognizer.name(),
                self.timeout
            ))),
        }
    }
}

fn source_rank(source: SpanSource) -> u8 {
    match source {
        SpanSource::RosterExact => 0,
        SpanSource::Ner => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic(text: &str) -> Vec<(String, f32)> {
        HeuristicRecognizer::new("[NAME]")
            .scan(text)
            .into_iter()
            .map(|s| (s.surface, s.confidence))
            .collect()
    }

    struct FailingRecognizer;

    #[async_trait]
    impl EntityRecognizer for FailingRecognizer {
        fn name(&self) -> &str {
            "failing"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<NameSpan>> {
            Err(Error::MalformedInput("model crashed".to_string()))
        }
    }

    struct SlowRecognizer;

    #[async_trait]
    impl EntityRecognizer for SlowRecognizer {
        fn name(&self) -> &str {
            "slow"
        }

        async fn recognize(&self, _text: &str) -> Result<Vec<NameSpan>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    /// Returns spans with bogus offsets
    struct SloppyRecognizer;

    #[async_trait]
    impl EntityRecognizer for SloppyRecognizer {
        fn name(&self) -> &str {
            "sloppy"
        }

        async fn recognize(&self, text: &str) -> Result<Vec<NameSpan>> {
            Ok(vec![NameSpan {
                start: 2,
                end: text.len() + 10,
                surface: "nope".to_string(),
                source: SpanSource::Ner,
                confidence: 0.99,
            }])
        }
    }

    fn detector(recognizer: Arc<dyn EntityRecognizer>, timeout: Duration) -> NameDetector {
        let roster = Arc::new(RosterIndex::from_names(["Sarah Johnson", "John Smith"]));
        NameDetector::new(recognizer, roster, "[NAME]", timeout, true)
    }

    #[test]
    fn test_heuristic_scoring() {
        assert_eq!(
            heuristic("I worked with Alan Turing today."),
            vec![("Alan Turing".to_string(), RUN_CONFIDENCE)]
        );
        assert_eq!(
            heuristic("Great! Prof. Kim will be happy."),
            vec![
                ("Great".to_string(), LOW_CONFIDENCE),
                ("Kim".to_string(), HONORIFIC_CONFIDENCE)
            ]
        );
        assert_eq!(
            heuristic("Tom & Jerry discussed this"),
            vec![
                ("Tom".to_string(), LOW_CONFIDENCE),
                ("Jerry".to_string(), WORD_CONFIDENCE)
            ]
        );
        assert_eq!(
            heuristic("Jane Doe asked"),
            vec![("Jane Doe".to_string(), SENTENCE_START_RUN_CONFIDENCE)]
        );
    }

    #[test]
    fn test_heuristic_modals_break_runs() {
        assert_eq!(
            heuristic("Could Alan Turing explain this?"),
            vec![("Alan Turing".to_string(), RUN_CONFIDENCE)]
        );
        assert_eq!(
            heuristic("Should Grace Hopper review it"),
            vec![("Grace Hopper".to_string(), RUN_CONFIDENCE)]
        );
        assert_eq!(
            heuristic("Will Smith said so"),
            vec![("Smith".to_string(), WORD_CONFIDENCE)]
        );
    }

    #[test]
    fn test_sentence_start_runs() {
        let confidences: Vec<f32> = heuristic("Jane Doe asked. Bob Jones replied.")
            .into_iter()
            .map(|(_, confidence)| confidence)
            .collect();
        assert_eq!(confidences, vec![SENTENCE_START_RUN_CONFIDENCE; 2]);
    }

    #[test]
    fn test_heuristic_skips_function_words_and_acronyms() {
        assert!(heuristic("The TA said I should ask. Thanks").is_empty());
        assert!(heuristic("see Lab 7 on Monday").is_empty());
    }

    #[test]
    fn test_heuristic_particles_join_runs() {
        assert_eq!(
            heuristic("met Maria de la Cruz there"),
            vec![("Maria de la Cruz".to_string(), RUN_CONFIDENCE)]
        );
        assert_eq!(
            heuristic("met Maria de la casa"),
            vec![("Maria".to_string(), WORD_CONFIDENCE)]
        );
    }

    #[test]
    fn test_heuristic_placeholder_breaks_runs() {
        assert_eq!(
            heuristic("[NAME] Bob Jones went"),
            vec![("Bob Jones".to_string(), LOW_CONFIDENCE)]
        );
        assert_eq!(
            heuristic("met Bob [NAME] today"),
            vec![("Bob".to_string(), LOW_CONFIDENCE)]
        );
        assert!(heuristic("[NAME] and [NAME]").is_empty());
        assert_eq!(
            heuristic("see Prof. Alan [NAME]"),
            vec![("Alan".to_string(), LOW_CONFIDENCE)]
        );
        assert_eq!(
            heuristic("see Maria de la [NAME]"),
            vec![("Maria".to_string(), LOW_CONFIDENCE)]
        );
    }

    #[test]
    fn test_sentence_start() {
        assert!(starts_sentence("Hello", 0));
        assert!(starts_sentence("Done. Bob", 6));
        assert!(starts_sentence("done\n\nBob", 6));
        assert!(starts_sentence("Done. (Bob", 7));
        assert!(!starts_sentence("ask Bob", 4));
        assert!(!starts_sentence("Smith, Bob", 7));
    }

    #[tokio::test]
    async fn test_detect_decodes_before_offsets() {
        let detector = detector(Arc::new(HeuristicRecognizer::new("[NAME]")), Duration::from_secs(1));
        let detection = detector.detect("Tom &amp; Sarah&#39;s code").await;

        assert_eq!(detection.text, "Tom & Sarah's code");
        assert!(!detection.degraded);
        for candidate in &detection.candidates {
            assert_eq!(&detection.text[candidate.start..candidate.end], candidate.surface);
        }
        assert!(
            detection
                .candidates
                .iter()
                .any(|c| c.surface == "Sarah" && c.source == SpanSource::RosterExact)
        );
    }

    #[tokio::test]
    async fn test_candidates_are_ordered() {
        let detector = detector(Arc::new(HeuristicRecognizer::new("[NAME]")), Duration::from_secs(1));
        let detection = detector.detect("ask John Smith and Sarah").await;

        let starts: Vec<usize> = detection.candidates.iter().map(|c| c.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        // Roster full name sorts before the recognizer span over the same range
        assert_eq!(detection.candidates[0].surface, "John Smith");
        assert_eq!(detection.candidates[0].source, SpanSource::RosterExact);
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_roster() {
        let detector = detector(Arc::new(FailingRecognizer), Duration::from_secs(1));
        let detection = detector.detect("John Smith asked").await;

        assert!(detection.degraded);
        assert!(detection.candidates.iter().all(|c| c.source == SpanSource::RosterExact));
        assert!(detection.candidates.iter().any(|c| c.surface == "John Smith"));
    }

    #[tokio::test]
    async fn test_model_timeout_degrades_to_roster() {
        let detector = detector(Arc::new(SlowRecognizer), Duration::from_millis(50));
        let detection = detector.detect("Sarah asked").await;

        assert!(detection.degraded);
        assert_eq!(detection.candidates.len(), 1);
        assert_eq!(detection.candidates[0].surface, "Sarah");
    }

    #[tokio::test]
    async fn test_invalid_recognizer_spans_are_dropped() {
        let detector = detector(Arc::new(SloppyRecognizer), Duration::from_secs(1));
        let detection = detector.detect("nothing here").await;

        assert!(!detection.degraded);
        assert!(detection.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_placeholders_are_protected() {
        let detector = detector(Arc::new(HeuristicRecognizer::new("[NAME]")), Duration::from_secs(1));
        let detection = detector.detect("[NAME] asked [NAME]").await;

        assert_eq!(detection.protected, vec![(0, 6), (13, 19)]);
        assert!(detection.candidates.is_empty());
        assert_eq!(detection.tokens.len(), 1);
    }
}
