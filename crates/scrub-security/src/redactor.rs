use scrub_core::{Error, NameSpan, Result};
use tracing::error;

/// Substitutes confirmed spans with a fixed placeholder
///
/// Span ordering is checked here again: a bad span list means the
/// disambiguation contract was broken, and the field is rejected rather
/// than rewritten.
pub struct SpanRedactor {
    placeholder: String,
}

impl SpanRedactor {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Copy `text`, writing the placeholder once for each span
    ///
    /// `spans` must be sorted by start and must not overlap.
    pub fn redact(&self, text: &str, spans: &[NameSpan]) -> Result<String> {
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;

        for (i, span) in spans.iter().enumerate() {
            if span.start < cursor {
                return Err(violation(format!(
                    "span {} at {}..{} overlaps or precedes offset {}",
                    i, span.start, span.end, cursor
                )));
            }
            if span.start >= span.end {
                return Err(violation(format!(
                    "span {} has empty range {}..{}",
                    i, span.start, span.end
                )));
            }

            let Some(slice) = text.get(span.start..span.end) else {
                return Err(violation(format!(
                    "span {} range {}..{} is not a valid slice of a {} byte text",
                    i,
                    span.start,
                    span.end,
                    text.len()
                )));
            };
            if slice != span.surface {
                return Err(violation(format!(
                    "span {} surface does not match the text at {}..{}",
                    i, span.start, span.end
                )));
            }

            // Text between spans is copied as-is
            output.push_str(&text[cursor..span.start]);
            output.push_str(&self.placeholder);
            cursor = span.end;
        }

        output.push_str(&text[cursor..]);
        Ok(output)
    }
}

fn violation(message: String) -> Error {
    // Never log the text itself; offsets are enough to debug
    error!(target: "scrub::invariant", "{}", message);
    Error::InvariantViolation(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrub_core::SpanSource;

    fn span(text: &str, start: usize, end: usize) -> NameSpan {
        NameSpan::new(text, start, end, SpanSource::RosterExact, 1.0).unwrap()
    }

    #[test]
    fn test_redact_replaces_each_span_once() {
        let text = "Ask Sarah  Johnson or Bob.";
        let redactor = SpanRedactor::new("[NAME]");
        let out = redactor
            .redact(text, &[span(text, 4, 18), span(text, 22, 25)])
            .unwrap();
        assert_eq!(out, "Ask [NAME] or [NAME].");
    }

    #[test]
    fn test_redact_without_spans_is_identity() {
        let redactor = SpanRedactor::new("[NAME]");
        assert_eq!(redactor.redact("Zoë said hi", &[]).unwrap(), "Zoë said hi");
        assert_eq!(redactor.redact("", &[]).unwrap(), "");
    }

    #[test]
    fn test_redact_multibyte_offsets() {
        let text = "José García: thanks";
        let redactor = SpanRedactor::new("<person>");
        let end = "José García".len();
        assert_eq!(
            redactor.redact(text, &[span(text, 0, end)]).unwrap(),
            "<person>: thanks"
        );
    }

    #[test]
    fn test_overlapping_spans_are_rejected() {
        let text = "John Smith";
        let redactor = SpanRedactor::new("[NAME]");
        let result = redactor.redact(text, &[span(text, 0, 10), span(text, 5, 10)]);
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_unsorted_spans_are_rejected() {
        let text = "Ann and Bo";
        let redactor = SpanRedactor::new("[NAME]");
        let result = redactor.redact(text, &[span(text, 8, 10), span(text, 0, 3)]);
        assert!(matches!(result, Err(Error::InvariantViolation(_))));
    }

    #[test]
    fn test_stale_spans_are_rejected() {
        let redactor = SpanRedactor::new("[NAME]");
        let stale = span("Ann and Bo", 0, 3);
        assert!(matches!(
            redactor.redact("Bob and Al", &[stale.clone()]),
            Err(Error::InvariantViolation(_))
        ));
        assert!(matches!(
            redactor.redact("An", &[stale]),
            Err(Error::InvariantViolation(_))
        ));
    }
}
