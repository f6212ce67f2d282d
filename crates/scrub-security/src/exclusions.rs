//! Common English words that are also first or last names
//!
//! The table is data, not control flow: additions go in [`BUILTIN`] (and bump
//! [`EXCLUSIONS_VERSION`]) or in the `[exclusions]` config section.

use std::collections::HashMap;

use crate::text::normalize;

/// Bump whenever [`BUILTIN`] changes
pub const EXCLUSIONS_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionRule {
    /// Redact only when the word is a roster name
    RosterOnly,
    /// Redact only when the word is a roster name written capitalized;
    /// reserved for auxiliaries whose lowercase form is never a name
    CapitalizedRoster,
}

use ExclusionRule::{CapitalizedRoster, RosterOnly};

pub const BUILTIN: &[(&str, ExclusionRule)] = &[
    // auxiliaries
    ("will", CapitalizedRoster),
    ("may", CapitalizedRoster),
    ("can", CapitalizedRoster),
    // verbs
    ("mark", RosterOnly),
    ("bill", RosterOnly),
    ("pat", RosterOnly),
    ("sue", RosterOnly),
    ("rob", RosterOnly),
    ("drew", RosterOnly),
    ("chase", RosterOnly),
    ("wade", RosterOnly),
    ("jack", RosterOnly),
    // nouns and adjectives
    ("grace", RosterOnly),
    ("hope", RosterOnly),
    ("joy", RosterOnly),
    ("faith", RosterOnly),
    ("rose", RosterOnly),
    ("dawn", RosterOnly),
    ("summer", RosterOnly),
    ("autumn", RosterOnly),
    ("art", RosterOnly),
    ("miles", RosterOnly),
    ("ray", RosterOnly),
    ("sandy", RosterOnly),
    ("penny", RosterOnly),
    ("frank", RosterOnly),
    ("long", RosterOnly),
    ("young", RosterOnly),
    ("white", RosterOnly),
    ("black", RosterOnly),
    ("brown", RosterOnly),
    ("green", RosterOnly),
    ("gray", RosterOnly),
    ("king", RosterOnly),
    ("hill", RosterOnly),
    ("page", RosterOnly),
    ("price", RosterOnly),
    ("bell", RosterOnly),
    ("cook", RosterOnly),
    ("hunter", RosterOnly),
    ("ruby", RosterOnly),
    ("lane", RosterOnly),
    // capitalized in ordinary use, usually a name when lowercase
    ("april", RosterOnly),
    ("june", RosterOnly),
    ("august", RosterOnly),
    ("christian", RosterOnly),
    ("earnest", RosterOnly),
    ("sterling", RosterOnly),
    ("jordan", RosterOnly),
    ("georgia", RosterOnly),
    ("victoria", RosterOnly),
    ("florence", RosterOnly),
];

#[derive(Debug, Clone)]
pub struct ExclusionTable {
    rules: HashMap<String, ExclusionRule>,
    custom: usize,
}

impl ExclusionTable {
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN
                .iter()
                .map(|&(word, rule)| (word.to_string(), rule))
                .collect(),
            custom: 0,
        }
    }

    /// Add words from configuration; later additions override earlier rules
    pub fn with_words<I, S>(mut self, words: I, rule: ExclusionRule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = normalize(word.as_ref());
            if word.is_empty() {
                continue;
            }
            self.rules.insert(word, rule);
            self.custom += 1;
        }
        self
    }

    pub fn rule_for(&self, normalized: &str) -> Option<ExclusionRule> {
        self.rules.get(normalized).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Version label for reports, e.g. `v1` or `v1+3` with custom words
    pub fn label(&self) -> String {
        if self.custom == 0 {
            format!("v{}", EXCLUSIONS_VERSION)
        } else {
            format!("v{}+{}", EXCLUSIONS_VERSION, self.custom)
        }
    }
}

impl Default for ExclusionTable {
    fn default() -> Self {
        Self::builtin()
    }
}
