use regex::Regex;
use std::collections::HashSet;

use crate::common::{NormalizedNumber, RelayResult};
use crate::config::ExtractionSettings;

/// A phone-number-shaped substring found in channel text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The substring as it appeared.
    pub matched: String,
    pub number: NormalizedNumber,
}

/// Best-effort phone number finder.
///
/// False positives and negatives are expected; the digit band keeps the
/// obvious ones (short codes, long ids) out.
#[derive(Debug, Clone)]
pub struct NumberExtractor {
    pattern: Regex,
    min_digits: usize,
    max_digits: usize,
}

impl NumberExtractor {
    pub fn new(settings: &ExtractionSettings) -> RelayResult<Self> {
        Ok(Self {
            pattern: Regex::new(&settings.pattern)?,
            min_digits: settings.min_digits,
            max_digits: settings.max_digits,
        })
    }

    /// Distinct in-band candidates, in order of first appearance.
    pub fn candidates(&self, text: &str) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        self.pattern
            .find_iter(text)
            .filter_map(|m| {
                let number = NormalizedNumber::from_raw(m.as_str());
                if !number.within_band(self.min_digits, self.max_digits) {
                    return None;
                }
                if !seen.insert(number.clone()) {
                    return None;
                }
                Some(Candidate {
                    matched: m.as_str().trim().to_string(),
                    number,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> NumberExtractor {
        NumberExtractor::new(&ExtractionSettings::default()).unwrap()
    }

    fn numbers(text: &str) -> Vec<String> {
        extractor()
            .candidates(text)
            .into_iter()
            .map(|c| c.number.to_string())
            .collect()
    }

    #[test]
    fn test_plain_number_after_code() {
        assert_eq!(numbers("code 123456 for 15550100"), vec!["15550100"]);
    }

    #[test]
    fn test_formatted_number() {
        let found = extractor().candidates("Your WhatsApp code 482-193 sent to +1 (555) 010-0199.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number.as_str(), "15550100199");
        assert_eq!(found[0].matched, "+1 (555) 010-0199");
    }

    #[test]
    fn test_multiple_numbers_one_per_line() {
        let text = "+8801711111111 OTP: 1234\n+8801822222222 OTP: 5678";
        assert_eq!(numbers(text), vec!["8801711111111", "8801822222222"]);
    }

    #[test]
    fn test_short_codes_are_ignored() {
        assert!(numbers("Your code is 123456").is_empty());
        assert!(numbers("G-1234567").is_empty());
    }

    #[test]
    fn test_over_long_runs_rejected() {
        assert!(numbers("txn 12345678901234567890").is_empty());
    }

    #[test]
    fn test_repeated_number_reported_once() {
        assert_eq!(numbers("15550100 ... again 1555-0100"), vec!["15550100"]);
    }

    #[test]
    fn test_custom_band_and_pattern() {
        let settings = ExtractionSettings {
            pattern: r"\d{6}".to_string(),
            min_digits: 6,
            max_digits: 6,
        };
        let extractor = NumberExtractor::new(&settings).unwrap();
        let found = extractor.candidates("pin 654321");
        assert_eq!(found[0].number.as_str(), "654321");
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let settings = ExtractionSettings {
            pattern: "(unclosed".to_string(),
            ..ExtractionSettings::default()
        };
        assert!(NumberExtractor::new(&settings).is_err());
    }
}
