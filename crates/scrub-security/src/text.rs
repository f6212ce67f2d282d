//! Text cleaning and normalization
//!
//! Detection and redaction both run on the output of [`clean_text`], so every
//! offset in the pipeline refers to decoded text.

use lazy_static::lazy_static;
use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

lazy_static! {
    static ref ENTITY_RE: Regex =
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r" {2,}").unwrap();
    static ref NEWLINES_RE: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Decode HTML entities, then optionally collapse whitespace
///
/// Idempotent: `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(text: &str, collapse_whitespace: bool) -> String {
    let decoded = decode_entities(text);
    if !collapse_whitespace {
        return decoded;
    }

    let text = SPACES_RE.replace_all(&decoded, " ");
    let text = NEWLINES_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Decode entities until none that we understand remain
///
/// Named entities cover the HTML5 table. `&amp;lt;` becomes `<` in one
/// call. Unknown entities are left verbatim.
pub fn decode_entities(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = ENTITY_RE
            .replace_all(&current, |caps: &Captures| {
                decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();

        // Each decoded entity removes an '&' or a ';' for good, so this terminates
        if next == current {
            return current;
        }
        current = next;
    }
}

fn decode_entity(body: &str) -> Option<String> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        if code == 0 {
            return None;
        }
        return char::from_u32(code).map(String::from);
    }

    // Plain space so whitespace collapsing sees it
    if body == "nbsp" {
        return Some(" ".to_string());
    }
    resolve_html5_entity(body).map(str::to_string)
}

/// Lowercase, trim, fold diacritics and typographic apostrophes
///
/// Internal whitespace runs collapse to a single space.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte ranges of every placeholder occurrence
pub fn placeholder_ranges(text: &str, placeholder: &str) -> Vec<(usize, usize)> {
    if placeholder.is_empty() {
        return Vec::new();
    }
    text.match_indices(placeholder)
        .map(|(start, p)| (start, start + p.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_common_entities() {
        assert_eq!(decode_entities("I&#39;m confused"), "I'm confused");
        assert_eq!(decode_entities("The &lt;template&gt; tag"), "The <template> tag");
        assert_eq!(decode_entities("Smith &amp; Jones"), "Smith & Jones");
        assert_eq!(decode_entities("Use &quot;quotes&quot;"), "Use \"quotes\"");
        assert_eq!(decode_entities("Here&#x27;s"), "Here's");
    }

    #[test]
    fn test_decode_accented_entities() {
        assert_eq!(decode_entities("Jos&eacute; Garc&iacute;a"), "José García");
        assert_eq!(decode_entities("Zo&euml; &amp; Fran&ccedil;ois"), "Zoë & François");
        assert_eq!(decode_entities("&rsquo;&hellip;&mdash;"), "\u{2019}\u{2026}\u{2014}");
    }

    #[test]
    fn test_decode_reaches_fixed_point() {
        assert_eq!(decode_entities("a &amp;amp; b"), "a & b");
        assert_eq!(decode_entities("&amp;lt;"), "<");
    }

    #[test]
    fn test_unknown_entities_survive() {
        assert_eq!(decode_entities("&bogus; &#0; &amp"), "&bogus; &#0; &amp");
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_text("  a   b \n\n\n\nc  ", true), "a b \n\nc");
        assert_eq!(clean_text("  a   b  ", false), "  a   b  ");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let samples = [
            "Tom &amp; Jerry   discussed &amp;amp; this\n\n\n\nok",
            "  &nbsp;&nbsp;x  ",
            "&#38;amp;",
        ];
        for sample in samples {
            let once = clean_text(sample, true);
            assert_eq!(clean_text(&once, true), once, "sample: {:?}", sample);
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Zoë  "), "zoe");
        assert_eq!(normalize("José  García"), "jose garcia");
        assert_eq!(normalize("O\u{2019}Neil"), "o'neil");
        assert_eq!(normalize("Mary-Jane"), "mary-jane");
    }

    #[test]
    fn test_placeholder_ranges() {
        let text = "[NAME] met [NAME].";
        assert_eq!(placeholder_ranges(text, "[NAME]"), vec![(0, 6), (11, 17)]);
        assert!(placeholder_ranges(text, "").is_empty());
    }
}
