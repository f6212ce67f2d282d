pub mod walker;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use scrub_config::{Config, FailurePolicy};
use scrub_core::{DiscussionNode, Error, Post, Result};
use scrub_security::{
    EntityRecognizer, ExclusionRule, ExclusionTable, NameRedactor, RedactorOptions, RosterIndex,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

pub use walker::{TreeStats, TreeWalker};

/// A post left out of the output, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPost {
    pub post_id: String,
    pub reason: String,
}

/// Summary of one batch; carries counts and ids only, never names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionReport {
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub posts_in: usize,
    pub posts_out: usize,
    pub nodes: usize,
    pub fields: usize,
    pub names_redacted: usize,
    pub degraded_fields: usize,
    pub skipped: Vec<SkippedPost>,
    pub roster_fingerprint: String,
    pub exclusions_version: String,
}

impl RedactionReport {
    fn new(posts_in: usize, roster_fingerprint: &str, exclusions_version: &str) -> Self {
        Self {
            generated_at: OffsetDateTime::now_utc(),
            posts_in,
            posts_out: 0,
            nodes: 0,
            fields: 0,
            names_redacted: 0,
            degraded_fields: 0,
            skipped: Vec::new(),
            roster_fingerprint: roster_fingerprint.to_string(),
            exclusions_version: exclusions_version.to_string(),
        }
    }

    fn record(&mut self, stats: &TreeStats) {
        self.nodes += stats.nodes;
        self.fields += stats.fields;
        self.names_redacted += stats.names_redacted;
        self.degraded_fields += stats.degraded_fields;
    }
}

/// Redaction options for a loaded configuration
pub fn redactor_options(config: &Config) -> RedactorOptions {
    let exclusions = ExclusionTable::builtin()
        .with_words(&config.exclusions.extra_words, ExclusionRule::RosterOnly)
        .with_words(
            &config.exclusions.capitalized_words,
            ExclusionRule::CapitalizedRoster,
        );

    RedactorOptions {
        placeholder: config.placeholder.clone(),
        ner_timeout: Duration::from_millis(config.limits.ner_timeout_ms),
        min_ner_confidence: config.detection.min_ner_confidence,
        collapse_whitespace: config.detection.collapse_whitespace,
        exclusions,
    }
}

/// Redacts discussion trees against one course roster
pub struct Scrubber {
    redactor: Arc<NameRedactor>,
    walker: TreeWalker,
    concurrency: usize,
    failure_policy: FailurePolicy,
}

impl Scrubber {
    pub fn new(roster: Arc<RosterIndex>, config: &Config) -> Self {
        let redactor = NameRedactor::new(roster, redactor_options(config));
        Self::from_redactor(Arc::new(redactor), config)
    }

    pub fn with_recognizer(
        roster: Arc<RosterIndex>,
        recognizer: Arc<dyn EntityRecognizer>,
        config: &Config,
    ) -> Self {
        let redactor = NameRedactor::with_recognizer(roster, recognizer, redactor_options(config));
        Self::from_redactor(Arc::new(redactor), config)
    }

    fn from_redactor(redactor: Arc<NameRedactor>, config: &Config) -> Self {
        Self {
            walker: TreeWalker::new(Arc::clone(&redactor), config.limits.max_depth),
            redactor,
            concurrency: config.limits.concurrency.max(1),
            failure_policy: config.failure_policy,
        }
    }

    pub fn redactor(&self) -> &NameRedactor {
        &self.redactor
    }

    pub async fn redact_tree(&self, node: DiscussionNode) -> Result<DiscussionNode> {
        self.walker.redact_tree(node).await
    }

    /// Redact posts concurrently; output keeps input order
    ///
    /// A failing post aborts the batch or is skipped, per the failure policy.
    /// Invariant violations always abort.
    pub async fn redact_posts(&self, posts: Vec<Post>) -> Result<(Vec<Post>, RedactionReport)> {
        let mut report = RedactionReport::new(
            posts.len(),
            self.redactor.roster().fingerprint(),
            self.redactor.exclusions_label(),
        );

        let walker = &self.walker;
        let mut results = stream::iter(posts.into_iter().map(|post| async move {
            let post_id = post.id();
            (post_id, walker.redact_post(post).await)
        }))
        .buffered(self.concurrency);

        let mut redacted = Vec::with_capacity(report.posts_in);
        while let Some((post_id, result)) = results.next().await {
            match result {
                Ok((post, stats)) => {
                    report.record(&stats);
                    redacted.push(post);
                }
                Err(err @ Error::InvariantViolation(_)) => return Err(err),
                Err(err) if self.failure_policy == FailurePolicy::Abort => return Err(err),
                Err(err) => {
                    warn!(post_id = %post_id, "Skipping post: {}", err);
                    report.skipped.push(SkippedPost {
                        post_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        report.posts_out = redacted.len();
        info!(
            posts = report.posts_out,
            skipped = report.skipped.len(),
            names = report.names_redacted,
            degraded = report.degraded_fields,
            "Redaction batch complete"
        );

        Ok((redacted, report))
    }
}
