//! Keyword families and line-scoped matching.
//!
//! Each family is a list of stems observed in real reports, including common
//! declensions and typos. Matching is done one line at a time so that numbers
//! elsewhere in the message never leak into a field.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::models::report::Field;

/// A named set of keyword stems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordFamily {
    Pieces,
    Weight,
    SealWaste,
    FlexoWaste,
    ExtrusionTrigger,
    Paint,
    Total,
}

/// Field keyword table. Stems are regex fragments over normalized text.
pub const KEYWORD_TABLE: &[(KeywordFamily, &[&str])] = &[
    (
        KeywordFamily::Pieces,
        &["паков", "паки", "упаков", r"\bpieces?\b", r"\bpcs\b", r"\bpacks?\b"],
    ),
    (KeywordFamily::Weight, &[r"\bвес", r"\bweight"]),
    (
        KeywordFamily::SealWaste,
        &["пакетосвар", r"bag[ \-]?seal", r"\bsealing"],
    ),
    (KeywordFamily::FlexoWaste, &["флекс", "фоекс", "flexo"]),
    (
        KeywordFamily::ExtrusionTrigger,
        &["экструз", "экструд", "extrus", "extruder"],
    ),
    (KeywordFamily::Paint, &["краск", r"\bpaint"]),
    (
        KeywordFamily::Total,
        &["итого", r"\bвсего", r"\btotal", r"grand[ \-]?total"],
    ),
];

/// Families whose presence on a line closes an extrusion breakdown.
pub const SECTION_STOP: [KeywordFamily; 6] = [
    KeywordFamily::Pieces,
    KeywordFamily::Weight,
    KeywordFamily::FlexoWaste,
    KeywordFamily::SealWaste,
    KeywordFamily::Paint,
    KeywordFamily::Total,
];

lazy_static! {
    static ref FAMILY_PATTERNS: HashMap<KeywordFamily, Regex> = KEYWORD_TABLE
        .iter()
        .map(|(family, stems)| {
            let pattern = stems.join("|");
            (*family, Regex::new(&pattern).unwrap())
        })
        .collect();
}

impl KeywordFamily {
    /// Keyword family that introduces a parsed field.
    pub fn for_field(field: Field) -> Option<Self> {
        match field {
            Field::Pieces => Some(KeywordFamily::Pieces),
            Field::Weight => Some(KeywordFamily::Weight),
            Field::SealWaste => Some(KeywordFamily::SealWaste),
            Field::FlexoWaste => Some(KeywordFamily::FlexoWaste),
            Field::ExtrusionWaste => Some(KeywordFamily::ExtrusionTrigger),
            Field::TotalWaste => None,
        }
    }
}

/// Lower-case the text and fold `ё` into `е`.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().replace('ё', "е")
}

/// Line-scoped keyword matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMatcher;

impl KeywordMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Whether a normalized line mentions the family.
    pub fn matches(&self, family: KeywordFamily, line: &str) -> bool {
        FAMILY_PATTERNS
            .get(&family)
            .is_some_and(|pattern| pattern.is_match(line))
    }

    /// Byte offset just past the first keyword of `family` in a normalized line.
    pub fn keyword_end(&self, family: KeywordFamily, line: &str) -> Option<usize> {
        FAMILY_PATTERNS
            .get(&family)
            .and_then(|pattern| pattern.find(line))
            .map(|m| m.end())
    }

    /// Whether a normalized line carries the keyword of `field`.
    pub fn matches_field(&self, field: Field, line: &str) -> bool {
        match KeywordFamily::for_field(field) {
            Some(family) => self.matches(family, line),
            None => false,
        }
    }

    /// Whether a normalized line starts another report section.
    pub fn is_section_stop(&self, line: &str) -> bool {
        let stop = SECTION_STOP.iter().any(|family| self.matches(*family, line));
        if stop {
            trace!(line, "section stop");
        }
        stop
    }
}
