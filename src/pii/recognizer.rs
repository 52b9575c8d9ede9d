//! Recognizer trait and the regex-based pattern recognizer

use super::context;
use super::{AnalyzerError, PiiEntity, DEFAULT_LANGUAGE};
use fancy_regex::Regex;

/// Anything able to label spans of text with an entity type and a score
pub trait EntityRecognizer: Send + Sync {
    /// Unique recognizer name
    fn name(&self) -> &str;

    /// Entity labels this recognizer can emit
    fn supported_entities(&self) -> Vec<String>;

    /// ISO 639-1 language this recognizer handles
    fn supported_language(&self) -> &str;

    /// Find candidate spans in `text`. Overlaps are resolved by the caller.
    fn analyze(&self, text: &str) -> Result<Vec<PiiEntity>, AnalyzerError>;
}

/// A named regular expression with a base score
#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub regex: Regex,
    pub score: f32,
}

impl Pattern {
    pub fn new(name: &str, regex: &str, score: f32) -> Result<Self, AnalyzerError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(AnalyzerError::InvalidPattern {
                name: name.to_string(),
                message: format!("score {} is outside [0, 1]", score),
            });
        }
        let regex = Regex::new(regex).map_err(|e| AnalyzerError::InvalidPattern {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            regex,
            score,
        })
    }
}

/// Checks a matched value; `false` discards the match, `true` raises it to 1.0
pub type Validator = fn(&str) -> bool;

/// Recognizer for one entity type defined by one or more regex patterns
pub struct PatternRecognizer {
    name: String,
    entity: String,
    language: String,
    patterns: Vec<Pattern>,
    context: Vec<String>,
    validator: Option<Validator>,
}

impl PatternRecognizer {
    pub fn new(entity: &str, patterns: Vec<Pattern>) -> Self {
        Self {
            name: format!("{}_recognizer", entity.to_lowercase()),
            entity: entity.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            patterns,
            context: Vec::new(),
            validator: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_lowercase();
        self
    }

    /// Words that, when found just before a match, raise its score
    pub fn with_context<S: AsRef<str>>(mut self, words: &[S]) -> Self {
        self.context = words.iter().map(|w| w.as_ref().to_lowercase()).collect();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_entities(&self) -> Vec<String> {
        vec![self.entity.clone()]
    }

    fn supported_language(&self) -> &str {
        &self.language
    }

    fn analyze(&self, text: &str) -> Result<Vec<PiiEntity>, AnalyzerError> {
        let mut results = Vec::new();

        for pattern in &self.patterns {
            for found in pattern.regex.find_iter(text) {
                let found = found.map_err(|e| AnalyzerError::Matching {
                    name: pattern.name.clone(),
                    message: e.to_string(),
                })?;
                if found.start() == found.end() {
                    continue;
                }

                let mut score = pattern.score;
                if let Some(validate) = self.validator {
                    if !validate(found.as_str()) {
                        continue;
                    }
                    score = 1.0;
                }
                if !self.context.is_empty() {
                    score = context::enhance(text, found.start(), &self.context, score);
                }

                results.push(PiiEntity {
                    entity_type: self.entity.clone(),
                    start: found.start(),
                    end: found.end(),
                    score,
                    recognizer: self.name.clone(),
                });
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_rejects_bad_score_and_regex() {
        assert!(Pattern::new("score", r"\d+", 1.5).is_err());
        assert!(Pattern::new("regex", r"(\d+", 0.5).is_err());
    }

    #[test]
    fn test_every_match_is_reported() {
        let recognizer =
            PatternRecognizer::new("ZIP", vec![Pattern::new("zip", r"\b\d{6}\b", 0.4).unwrap()]);

        let results = recognizer.analyze("from 560001 to 110001").unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!((results[0].start, results[0].end), (5, 11));
        assert_eq!((results[1].start, results[1].end), (15, 21));
        assert!(results.iter().all(|r| r.entity_type == "ZIP" && r.score == 0.4));
    }

    #[test]
    fn test_validator_filters_and_promotes() {
        fn even_only(value: &str) -> bool {
            value.parse::<u32>().map(|n| n % 2 == 0).unwrap_or(false)
        }
        let recognizer =
            PatternRecognizer::new("EVEN", vec![Pattern::new("num", r"\b\d+\b", 0.3).unwrap()])
                .with_validator(even_only);

        let results = recognizer.analyze("7 and 12").unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].start, 6);
        assert_eq!(results[0].score, 1.0);
    }

    #[test]
    fn test_language_is_normalized() {
        let recognizer = PatternRecognizer::new("X", Vec::new()).with_language("ES");
        assert_eq!(recognizer.supported_language(), "es");
        assert_eq!(recognizer.name(), "x_recognizer");
    }
}
