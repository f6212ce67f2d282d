//! Course roster index
//!
//! Built once per course and shared read-only (behind an `Arc`) by every
//! redaction task of a pass.

use std::collections::{BTreeMap, HashSet};

use scrub_core::{NameSpan, SpanSource};
use serde::{Deserialize, Serialize};

use crate::lexicon::{is_honorific, is_particle};
use crate::text::normalize;
use crate::tokenize::{Token, is_horizontal_gap};

/// A participant as listed by the roster collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Roster file: either a list of users or a map of participant id to name
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RosterFile {
    Users(Vec<RosterUser>),
    ById(BTreeMap<String, String>),
}

impl RosterFile {
    pub fn into_names(self) -> Vec<String> {
        match self {
            RosterFile::Users(users) => users.into_iter().map(|u| u.name).collect(),
            RosterFile::ById(map) => map.into_values().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub full_name: String,
    pub normalized_first: String,
    /// Everything after the first name; multi-part surnames stay whole
    pub normalized_last: String,
}

impl RosterEntry {
    /// Parse a display name, dropping leading honorifics such as `Prof.`
    pub fn parse(full_name: &str) -> Option<Self> {
        let parts: Vec<String> = full_name
            .split_whitespace()
            .map(clean_part)
            .filter(|p| !p.is_empty())
            .skip_while(|p| is_honorific(p))
            .collect();

        let (first, rest) = parts.split_first()?;
        Some(Self {
            full_name: full_name.trim().to_string(),
            normalized_first: first.clone(),
            normalized_last: rest.join(" "),
        })
    }

    pub fn normalized_full(&self) -> String {
        if self.normalized_last.is_empty() {
            self.normalized_first.clone()
        } else {
            format!("{} {}", self.normalized_first, self.normalized_last)
        }
    }
}

fn clean_part(part: &str) -> String {
    normalize(part)
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

#[derive(Debug, Clone)]
pub struct RosterIndex {
    entries: Vec<RosterEntry>,
    /// Single normalized words: first names, last names, surname parts
    tokens: HashSet<String>,
    /// Multi-word normalized sequences: full names, multi-part surnames
    phrases: HashSet<String>,
    max_phrase_tokens: usize,
    fingerprint: String,
}

impl RosterIndex {
    pub fn build(entries: Vec<RosterEntry>) -> Self {
        let mut tokens = HashSet::new();
        let mut phrases = HashSet::new();
        let mut max_phrase_tokens = 1;

        for entry in &entries {
            let full = entry.normalized_full();
            let words = full.split(' ').count();
            max_phrase_tokens = max_phrase_tokens.max(words);
            if words > 1 {
                phrases.insert(full);
            }

            insert_token(&mut tokens, &entry.normalized_first);
            if entry.normalized_last.contains(' ') {
                phrases.insert(entry.normalized_last.clone());
                for part in entry.normalized_last.split(' ') {
                    insert_token(&mut tokens, part);
                }
            } else {
                insert_token(&mut tokens, &entry.normalized_last);
            }
        }

        let fingerprint = fingerprint(&entries);
        Self {
            entries,
            tokens,
            phrases,
            max_phrase_tokens,
            fingerprint,
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(
            names
                .into_iter()
                .filter_map(|name| RosterEntry::parse(name.as_ref()))
                .collect(),
        )
    }

    pub fn empty() -> Self {
        Self::build(Vec::new())
    }

    /// Whether a normalized word or word sequence names someone on the roster
    pub fn contains(&self, normalized: &str) -> bool {
        self.tokens.contains(normalized) || self.phrases.contains(normalized)
    }

    /// Longest roster name starting at `tokens[start]`
    pub fn longest_match(&self, text: &str, tokens: &[Token], start: usize) -> Option<NameSpan> {
        self.matches_at(text, tokens, start).into_iter().next()
    }

    /// Every roster name starting at `tokens[start]`, longest first
    ///
    /// Consecutive words must be separated by spaces or tabs only.
    pub fn matches_at(&self, text: &str, tokens: &[Token], start: usize) -> Vec<NameSpan> {
        let mut found = Vec::new();
        if start >= tokens.len() {
            return found;
        }

        let mut key = String::new();
        let window = self.max_phrase_tokens.min(tokens.len() - start);
        for len in 1..=window {
            let idx = start + len - 1;
            if len > 1 {
                if !is_horizontal_gap(text, tokens[idx - 1].end, tokens[idx].start) {
                    break;
                }
                key.push(' ');
            }
            key.push_str(&normalize(tokens[idx].as_str(text)));

            let hit = if len == 1 {
                self.tokens.contains(&key)
            } else {
                self.phrases.contains(&key)
            };
            if hit {
                if let Some(span) = NameSpan::new(
                    text,
                    tokens[start].start,
                    tokens[idx].end,
                    SpanSource::RosterExact,
                    1.0,
                ) {
                    found.push(span);
                }
            }
        }

        found.reverse();
        found
    }

    /// Every roster match in the text, ordered by start
    pub fn scan(&self, text: &str, tokens: &[Token]) -> Vec<NameSpan> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        (0..tokens.len())
            .flat_map(|i| self.matches_at(text, tokens, i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// BLAKE3 digest of the normalized names; identifies a roster without
    /// carrying any name
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn insert_token(tokens: &mut HashSet<String>, word: &str) {
    // Initials and particles are too ambiguous to match alone
    if word.chars().count() > 1 && !is_particle(word) {
        tokens.insert(word.to_string());
    }
}

fn fingerprint(entries: &[RosterEntry]) -> String {
    let mut names: Vec<String> = entries.iter().map(RosterEntry::normalized_full).collect();
    names.sort();
    names.dedup();

    let mut hasher = blake3::Hasher::new();
    for name in &names {
        hasher.update(name.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}
