//! PII recognition engine
//!
//! Pattern recognizers register into a [`RecognizerRegistry`]; the
//! [`AnalyzerEngine`] runs every recognizer that supports the requested
//! language over a text and resolves overlapping candidates into a single,
//! ordered list of [`PiiEntity`] spans.
//!
//! Two families of recognizers ship by default:
//! - predefined recognizers for common identifiers (email, credit card,
//!   IP address, URL, PAN), see [`predefined`]
//! - Indian identity recognizers (Aadhaar, phone, postal address), see [`custom`]
//!
//! Additional pattern recognizers can be loaded from TOML at startup.

pub mod analyzer;
pub mod conflict;
pub mod context;
pub mod custom;
pub mod predefined;
pub mod recognizer;
pub mod registry;

pub use analyzer::AnalyzerEngine;
pub use recognizer::{EntityRecognizer, Pattern, PatternRecognizer};
pub use registry::RecognizerRegistry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Language used when callers don't ask for one
pub const DEFAULT_LANGUAGE: &str = "en";

/// A typed PII span in an analyzed text.
///
/// `start` and `end` are byte offsets into the text passed to
/// [`AnalyzerEngine::analyze`], so `&text[start..end]` is the matched value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiEntity {
    #[serde(rename = "entity")]
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
    /// Name of the recognizer that produced the span
    #[serde(skip)]
    pub recognizer: String,
}

impl PiiEntity {
    pub fn overlaps(&self, other: &PiiEntity) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the span is a valid, non-empty range of a text of `text_len` bytes
    pub fn fits(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }
}

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No recognizers support language '{0}'")]
    UnsupportedLanguage(String),

    #[error("Invalid pattern '{name}': {message}")]
    InvalidPattern { name: String, message: String },

    #[error("Pattern '{name}' failed while matching: {message}")]
    Matching { name: String, message: String },

    #[error("Failed to load pattern file: {0}")]
    PatternFile(String),
}
