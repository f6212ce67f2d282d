use serde::{Deserialize, Serialize};

/// Where a candidate name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    Ner,
    RosterExact,
}

/// A candidate or confirmed person-name span
///
/// `start` and `end` are half-open byte offsets into the cleaned text and
/// always sit on `char` boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameSpan {
    pub start: usize,
    pub end: usize,
    pub surface: String,
    pub source: SpanSource,
    pub confidence: f32,
}

impl NameSpan {
    /// Build a span over `text[start..end]`, or `None` if the range is not a
    /// valid non-empty slice of `text`
    pub fn new(
        text: &str,
        start: usize,
        end: usize,
        source: SpanSource,
        confidence: f32,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        let surface = text.get(start..end)?;
        Some(Self {
            start,
            end,
            surface: surface.to_string(),
            source,
            confidence,
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &NameSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn overlaps_range(&self, start: usize, end: usize) -> bool {
        self.start < end && start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_rejects_bad_ranges() {
        let text = "Zoë Park";
        assert!(NameSpan::new(text, 3, 3, SpanSource::Ner, 0.5).is_none());
        assert!(NameSpan::new(text, 0, 99, SpanSource::Ner, 0.5).is_none());
        // 'ë' is two bytes; offset 3 is inside it
        assert!(NameSpan::new(text, 0, 3, SpanSource::Ner, 0.5).is_none());

        let span = NameSpan::new(text, 0, 4, SpanSource::RosterExact, 1.0).unwrap();
        assert_eq!(span.surface, "Zoë");
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn test_overlap() {
        let text = "Jane Doe Smith";
        let a = NameSpan::new(text, 0, 8, SpanSource::Ner, 0.9).unwrap();
        let b = NameSpan::new(text, 5, 14, SpanSource::Ner, 0.9).unwrap();
        let c = NameSpan::new(text, 9, 14, SpanSource::Ner, 0.9).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(b.overlaps_range(0, 6));
    }
}
