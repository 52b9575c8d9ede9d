//! Document text assembly
//!
//! Joins accepted fragments into the single text blob the PII engine scans,
//! remembering where each fragment landed.

use crate::recognition::TextFragment;
use crate::segmentation::Region;
use serde::Serialize;

/// Where one fragment sits inside the assembled text (byte offsets)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentSpan {
    pub region: Region,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Fragments joined with single spaces, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssembledText {
    pub text: String,
    pub spans: Vec<FragmentSpan>,
}

impl AssembledText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The fragment span containing byte `offset`, if any
    pub fn span_at(&self, offset: usize) -> Option<&FragmentSpan> {
        self.spans
            .iter()
            .find(|s| s.start <= offset && offset < s.end)
    }
}

/// Concatenate fragments with a single space separator.
/// No trimming or normalization is applied to the fragment texts.
pub fn assemble(fragments: &[TextFragment]) -> AssembledText {
    let mut text = String::with_capacity(fragments.iter().map(|f| f.text.len() + 1).sum());
    let mut spans = Vec::with_capacity(fragments.len());

    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        let start = text.len();
        text.push_str(&fragment.text);
        spans.push(FragmentSpan {
            region: fragment.region,
            start,
            end: text.len(),
            confidence: fragment.confidence,
        });
    }

    AssembledText { text, spans }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, x: u32) -> TextFragment {
        TextFragment {
            region: Region::new(x, 0, 60, 25),
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_fragments_joined_with_single_space() {
        let assembled = assemble(&[fragment("My Aadhaar", 0), fragment("is 1234 5678 9012", 1)]);
        assert_eq!(assembled.as_str(), "My Aadhaar is 1234 5678 9012");
    }

    #[test]
    fn test_order_and_whitespace_preserved() {
        let assembled = assemble(&[fragment(" second ", 0), fragment("first", 1)]);
        assert_eq!(assembled.as_str(), " second  first");
    }

    #[test]
    fn test_empty_input() {
        let assembled = assemble(&[]);
        assert!(assembled.is_empty());
        assert!(assembled.spans.is_empty());
    }

    #[test]
    fn test_spans_trace_back_to_regions() {
        let assembled = assemble(&[fragment("Call", 10), fragment("9812345670", 20)]);

        assert_eq!(assembled.spans[1].start, 5);
        assert_eq!(assembled.spans[1].end, 15);
        assert_eq!(&assembled.text[5..15], "9812345670");
        assert_eq!(assembled.span_at(7).unwrap().region.x, 20);
        // The separator belongs to no fragment
        assert!(assembled.span_at(4).is_none());
    }

    #[test]
    fn test_assembly_is_repeatable() {
        let fragments = vec![fragment("a", 0), fragment("b", 1), fragment("c", 2)];
        assert_eq!(assemble(&fragments), assemble(&fragments));
    }
}
