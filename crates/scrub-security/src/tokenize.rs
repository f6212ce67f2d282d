//! Word tokenizer shared by roster scanning, recognition and disambiguation

use unicode_normalization::char::is_combining_mark;

/// A word as a half-open byte range into the text it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or_default()
    }

    pub fn is_within(&self, ranges: &[(usize, usize)]) -> bool {
        ranges
            .iter()
            .any(|&(start, end)| self.start < end && start < self.end)
    }
}

/// Split text into words
///
/// Hyphens and apostrophes between two word characters stay inside the word
/// (`Mary-Jane`, `O'Neil`). A trailing possessive `'s` is left out of the
/// token so `Sarah's` yields `Sarah`.
pub fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].1.is_alphanumeric() {
            i += 1;
            continue;
        }

        let start = chars[i].0;
        let mut j = i + 1;
        while j < chars.len() {
            let c = chars[j].1;
            if is_word_char(c) {
                j += 1;
            } else if is_joiner(c) && chars.get(j + 1).is_some_and(|&(_, n)| n.is_alphanumeric()) {
                j += 2;
            } else {
                break;
            }
        }

        let end = chars.get(j).map_or(text.len(), |&(idx, _)| idx);
        tokens.push(Token {
            start,
            end: strip_possessive(text, start, end),
        });
        i = j;
    }

    tokens
}

/// Text between two offsets is a non-empty run of spaces or tabs
pub fn is_horizontal_gap(text: &str, from: usize, to: usize) -> bool {
    from < to
        && text
            .get(from..to)
            .is_some_and(|gap| gap.chars().all(|c| c == ' ' || c == '\t'))
}

pub fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c)
}

fn is_joiner(c: char) -> bool {
    matches!(c, '-' | '\'' | '\u{2010}' | '\u{2019}')
}

fn strip_possessive(text: &str, start: usize, end: usize) -> usize {
    let word = &text[start..end];
    for suffix in ["'s", "'S", "\u{2019}s", "\u{2019}S"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if !stem.is_empty() {
                return start + stem.len();
            }
        }
    }
    end
}
