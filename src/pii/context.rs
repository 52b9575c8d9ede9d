//! Context-word score enhancement

/// Added to a match's score when a context word precedes it
pub const CONTEXT_SIMILARITY_FACTOR: f32 = 0.35;
/// Floor for scores raised by context
pub const MIN_SCORE_WITH_CONTEXT: f32 = 0.4;
/// How many words before a match are inspected
pub const CONTEXT_PREFIX_WORDS: usize = 5;

/// Raise `score` when one of `context` (lowercase) appears among the words
/// right before byte offset `match_start`.
pub fn enhance(text: &str, match_start: usize, context: &[String], score: f32) -> f32 {
    let Some(prefix) = text.get(..match_start) else {
        return score;
    };

    let found = prefix
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .rev()
        .take(CONTEXT_PREFIX_WORDS)
        .any(|word| {
            let word = word.to_lowercase();
            context.iter().any(|c| *c == word)
        });

    if found {
        (score + CONTEXT_SIMILARITY_FACTOR)
            .max(MIN_SCORE_WITH_CONTEXT)
            .min(1.0)
    } else {
        score
    }
}
