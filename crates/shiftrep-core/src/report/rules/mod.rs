//! Rule-based extractors for shift reports.

pub mod numbers;
pub mod keywords;
pub mod extrusion;
pub mod patterns;

pub use numbers::{first_number, parse_number, round2, scan_numbers, sum_numbers, NumberScanner};
pub use keywords::{normalize, KeywordFamily, KeywordMatcher};
pub use extrusion::{ExtrusionScan, ExtrusionSubParser};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value found in text, with where it came from.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
