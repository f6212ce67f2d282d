//! Person-name redaction for a single text field
//!
//! Pipeline: [`text::clean_text`] → [`NameDetector`] (roster scan plus an
//! [`EntityRecognizer`]) → [`Disambiguator`] → [`SpanRedactor`].
//! [`NameRedactor`] wires the stages together.

pub mod detector;
pub mod disambiguator;
pub mod exclusions;
pub mod lexicon;
pub mod redactor;
pub mod roster;
pub mod text;
pub mod tokenize;

use std::sync::Arc;
use std::time::Duration;

use scrub_core::{DEFAULT_PLACEHOLDER, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use detector::{Detection, EntityRecognizer, HeuristicRecognizer, NameDetector};
pub use disambiguator::Disambiguator;
pub use exclusions::{EXCLUSIONS_VERSION, ExclusionRule, ExclusionTable};
pub use redactor::SpanRedactor;
pub use roster::{RosterEntry, RosterFile, RosterIndex, RosterUser};

/// Outcome of redacting one text field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRedaction {
    pub text: String,
    /// Number of placeholders written
    pub names: usize,
    /// Recognizer was unavailable; only roster names were considered
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct RedactorOptions {
    pub placeholder: String,
    pub ner_timeout: Duration,
    pub min_ner_confidence: f32,
    pub collapse_whitespace: bool,
    pub exclusions: ExclusionTable,
}

impl Default for RedactorOptions {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            ner_timeout: Duration::from_millis(2000),
            min_ner_confidence: 0.85,
            collapse_whitespace: true,
            exclusions: ExclusionTable::builtin(),
        }
    }
}

/// Redacts person names from one field against a shared roster
pub struct NameRedactor {
    roster: Arc<RosterIndex>,
    detector: NameDetector,
    disambiguator: Disambiguator,
    redactor: SpanRedactor,
    exclusions_label: String,
}

impl NameRedactor {
    /// Redactor backed by the bundled [`HeuristicRecognizer`]
    pub fn new(roster: Arc<RosterIndex>, options: RedactorOptions) -> Self {
        let recognizer = Arc::new(HeuristicRecognizer::new(options.placeholder.clone()));
        Self::with_recognizer(roster, recognizer, options)
    }

    pub fn with_recognizer(
        roster: Arc<RosterIndex>,
        recognizer: Arc<dyn EntityRecognizer>,
        options: RedactorOptions,
    ) -> Self {
        let exclusions_label = options.exclusions.label();
        let detector = NameDetector::new(
            recognizer,
            Arc::clone(&roster),
            options.placeholder.clone(),
            options.ner_timeout,
            options.collapse_whitespace,
        );
        let disambiguator = Disambiguator::new(
            Arc::clone(&roster),
            Arc::new(options.exclusions),
            options.min_ner_confidence,
        );

        Self {
            roster,
            detector,
            disambiguator,
            redactor: SpanRedactor::new(options.placeholder),
            exclusions_label,
        }
    }

    /// Redact one field; the returned text is the cleaned text with every
    /// confirmed name replaced by the placeholder
    pub async fn redact(&self, raw: &str) -> Result<FieldRedaction> {
        if raw.is_empty() {
            return Ok(FieldRedaction {
                text: String::new(),
                names: 0,
                degraded: false,
            });
        }

        let detection = self.detector.detect(raw).await;
        let spans = self.disambiguator.resolve(
            &detection.text,
            &detection.tokens,
            &detection.protected,
            &detection.candidates,
        );
        let text = self.redactor.redact(&detection.text, &spans)?;

        debug!(
            candidates = detection.candidates.len(),
            names = spans.len(),
            degraded = detection.degraded,
            "Redacted field"
        );

        Ok(FieldRedaction {
            text,
            names: spans.len(),
            degraded: detection.degraded,
        })
    }

    pub fn roster(&self) -> &RosterIndex {
        &self.roster
    }

    pub fn placeholder(&self) -> &str {
        self.redactor.placeholder()
    }

    /// Exclusion table version, e.g. `v1+2`
    pub fn exclusions_label(&self) -> &str {
        &self.exclusions_label
    }
}
