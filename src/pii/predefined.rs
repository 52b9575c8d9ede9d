//! Predefined recognizers for common identifiers
//!
//! These form the general-purpose layer of the analyzer: every registry built
//! with [`RecognizerRegistry::with_predefined`](super::RecognizerRegistry::with_predefined)
//! starts with them.

use super::recognizer::{Pattern, PatternRecognizer};
use super::AnalyzerError;

pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
pub const CREDIT_CARD: &str = "CREDIT_CARD";
pub const IP_ADDRESS: &str = "IP_ADDRESS";
pub const URL: &str = "URL";
pub const IN_PAN: &str = "IN_PAN";

pub fn email_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        EMAIL_ADDRESS,
        vec![Pattern::new(
            "Email (Medium)",
            r"\b[A-Za-z0-9][A-Za-z0-9._%+\-]*@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}\b",
            0.5,
        )?],
    )
    .with_context(&["email", "mail", "e-mail"])
    .with_validator(valid_email))
}

pub fn credit_card_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        CREDIT_CARD,
        vec![Pattern::new(
            "All Credit Cards (weak)",
            r"\b(?:4\d{3}|5[0-5]\d{2}|6\d{3}|1\d{3}|3\d{3})[- ]?\d{3,4}[- ]?\d{3,4}[- ]?\d{3,5}\b",
            0.3,
        )?],
    )
    .with_context(&["credit", "card", "visa", "mastercard", "amex", "debit"])
    .with_validator(luhn_valid))
}

pub fn ip_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        IP_ADDRESS,
        vec![Pattern::new(
            "IPv4",
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
            0.6,
        )?],
    )
    .with_context(&["ip", "ipv4"]))
}

pub fn url_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        URL,
        vec![Pattern::new(
            "Standard Url",
            r#"\b(?:https?://|www\.)[^\s<>"']+[^\s<>"'.,;:!?)]"#,
            0.5,
        )?],
    )
    .with_context(&["url", "website", "link", "site"]))
}

pub fn pan_recognizer() -> Result<PatternRecognizer, AnalyzerError> {
    Ok(PatternRecognizer::new(
        IN_PAN,
        vec![Pattern::new(
            "PAN (High)",
            r"\b[A-Za-z]{3}[AaBbCcFfGgHhJjLlPpTt][A-Za-z][0-9]{4}[A-Za-z]\b",
            0.85,
        )?],
    )
    .with_context(&["pan", "permanent", "income", "tax"]))
}

/// All predefined recognizers
pub fn all() -> Result<Vec<PatternRecognizer>, AnalyzerError> {
    Ok(vec![
        email_recognizer()?,
        credit_card_recognizer()?,
        ip_recognizer()?,
        url_recognizer()?,
        pan_recognizer()?,
    ])
}

/// Luhn checksum over the digits of `candidate`
pub fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 12 {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

fn valid_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.ends_with('.')
        && !local.contains("..")
        && !domain.contains("..")
        && !domain.starts_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pii::EntityRecognizer;

    fn spans(recognizer: &PatternRecognizer, text: &str) -> Vec<(String, f32)> {
        recognizer
            .analyze(text)
            .unwrap()
            .into_iter()
            .map(|e| (text[e.start..e.end].to_string(), e.score))
            .collect()
    }

    #[test]
    fn test_luhn() {
        assert!(luhn_valid("4111 1111 1111 1111"));
        assert!(luhn_valid("4012-8888-8888-1881"));
        assert!(!luhn_valid("4111 1111 1111 1112"));
        assert!(!luhn_valid("1234 5678 9012"));
    }

    #[test]
    fn test_credit_card_requires_valid_checksum() {
        let recognizer = credit_card_recognizer().unwrap();
        assert_eq!(
            spans(&recognizer, "pay with 4111 1111 1111 1111 now"),
            vec![("4111 1111 1111 1111".to_string(), 1.0)]
        );
        assert!(spans(&recognizer, "pay with 4111 1111 1111 1112 now").is_empty());
    }

    #[test]
    fn test_twelve_digit_groups_are_not_cards() {
        let recognizer = credit_card_recognizer().unwrap();
        assert!(spans(&recognizer, "1234 5678 9012").is_empty());
    }

    #[test]
    fn test_email() {
        let recognizer = email_recognizer().unwrap();
        assert_eq!(
            spans(&recognizer, "write to asha.rao@example.co.in today"),
            vec![("asha.rao@example.co.in".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_ip_with_context() {
        let recognizer = ip_recognizer().unwrap();
        let found = spans(&recognizer, "server ip 192.168.1.20");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "192.168.1.20");
        assert!((found[0].1 - 0.95).abs() < 1e-6);
        assert!(spans(&recognizer, "version 999.1.1.1").is_empty());
    }

    #[test]
    fn test_url_drops_trailing_punctuation() {
        let recognizer = url_recognizer().unwrap();
        let found = spans(&recognizer, "see https://example.org/a?b=1.");
        assert_eq!(found[0].0, "https://example.org/a?b=1");
    }

    #[test]
    fn test_pan() {
        let recognizer = pan_recognizer().unwrap();
        let found = spans(&recognizer, "Number ABCPE1234F");
        assert_eq!(found, vec![("ABCPE1234F".to_string(), 0.85)]);
    }
}
