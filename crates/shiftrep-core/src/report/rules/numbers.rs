//! Number scanning for free-text reports.
//!
//! Recognizes `120`, `1 250`, `1 250,5`, `3.75` and signed forms such as `-3`.
//! The sign is dropped: report figures are magnitudes.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::patterns::NUMBER_PATTERN;
use super::{ExtractionMatch, FieldExtractor};

/// Numeric token extractor.
pub struct NumberScanner;

impl NumberScanner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NumberScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for NumberScanner {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        NUMBER_PATTERN
            .find_iter(text)
            .filter_map(|m| {
                let value = parse_number(m.as_str())?;
                Some(ExtractionMatch::new(value, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }
}

/// Parse a single numeric token into its magnitude.
///
/// Returns `None` for anything the decimal type cannot hold.
pub fn parse_number(token: &str) -> Option<Decimal> {
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok().map(|d| d.abs())
}

/// All numbers in `text`, in order of appearance.
pub fn scan_numbers(text: &str) -> Vec<Decimal> {
    NumberScanner::new()
        .extract_all(text)
        .into_iter()
        .map(|m| m.value)
        .collect()
}

/// First number in `text`.
pub fn first_number(text: &str) -> Option<Decimal> {
    NumberScanner::new().extract(text).map(|m| m.value)
}

/// Sum of all numbers in `text`, rounded to 2 decimal places.
pub fn sum_numbers(text: &str) -> Decimal {
    round2(scan_numbers(text).into_iter().sum())
}

/// Round to 2 decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("120"), Some(d("120")));
        assert_eq!(parse_number("1 250"), Some(d("1250")));
        assert_eq!(parse_number("1\u{00a0}250,5"), Some(d("1250.5")));
        assert_eq!(parse_number("3.75"), Some(d("3.75")));
        assert_eq!(parse_number("-3"), Some(d("3")));
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn test_scan_numbers_groups_thousands() {
        assert_eq!(scan_numbers("вес 1 250,5 кг"), vec![d("1250.5")]);
        assert_eq!(scan_numbers("м 3 т 2"), vec![d("3"), d("2")]);
    }

    #[test]
    fn test_scan_numbers_rejects_partial_group() {
        assert_eq!(scan_numbers("12 3456"), vec![d("12"), d("3456")]);
        assert_eq!(scan_numbers("1234 567"), vec![d("1234"), d("567")]);
    }

    #[test]
    fn test_scan_numbers_discards_sign() {
        assert_eq!(scan_numbers("м-3, т +2"), vec![d("3"), d("2")]);
    }

    #[test]
    fn test_scan_numbers_empty() {
        assert!(scan_numbers("нет данных").is_empty());
        assert_eq!(first_number("нет данных"), None);
        assert_eq!(sum_numbers(""), Decimal::ZERO);
    }

    #[test]
    fn test_overlong_token_is_skipped() {
        let text = "999999999999999999999999999999999 и 7";
        assert_eq!(scan_numbers(text), vec![d("7")]);
    }

    #[test]
    fn test_sum_numbers_rounds() {
        assert_eq!(sum_numbers("0,125 0,001"), d("0.13"));
        assert_eq!(sum_numbers("1,005"), d("1.01"));
    }

    #[test]
    fn test_extract_positions() {
        let scanner = NumberScanner::new();
        let found = scanner.extract("паков 120").unwrap();
        assert_eq!(found.value, d("120"));
        assert_eq!(found.position, Some((11, 14)));
    }
}
