//! Indian identity recognizers: Aadhaar numbers, mobile numbers and postal addresses

use super::recognizer::{Pattern, PatternRecognizer};
use super::AnalyzerError;

pub const IND_AADHAAR: &str = "IND_AADHAAR";
pub const IND_PHONE: &str = "IND_PHONE";
pub const IND_ADDRESS: &str = "IND_ADDRESS";

/// 12 digits, optionally grouped 4-4-4. Digits right after a `+` belong to a
/// dialling code, not to an Aadhaar number.
const AADHAAR_REGEX: &str = r"(?<!\+)\b\d{4}\s?\d{4}\s?\d{4}\b";

/// 10-digit mobile number starting with 6-9, optionally prefixed by +91
const PHONE_REGEX: &str = r"(?:\+91[\-\s]?|\b)[6-9]\d{9}\b";

/// House number, street words and a trailing 6-digit PIN code
const ADDRESS_REGEX: &str =
    r"\b(?:\d{1,4}[,.\-/\s]?[a-zA-Z0-9\s]+[,.\-/\s]?)?\b(?:[a-zA-Z\s]+[,.\-/\s]?)?\b\d{6}\b";

pub fn aadhaar_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        IND_AADHAAR,
        vec![Pattern::new("Aadhaar Number", AADHAAR_REGEX, 0.9)?],
    ))
}

pub fn phone_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        IND_PHONE,
        vec![Pattern::new("Indian Phone Number", PHONE_REGEX, 0.85)?],
    ))
}

pub fn address_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        IND_ADDRESS,
        vec![Pattern::new("Indian Address", ADDRESS_REGEX, 0.8)?],
    ))
}

/// The three Indian recognizers, registered at startup
pub fn indian_recognizers() -> Result<Vec<PatternRecognizer>, AnalyzerError> {
    Ok(vec![
        aadhaar_recognizer()?,
        phone_recognizer()?,
        address_recognizer()?,
    ])
}
