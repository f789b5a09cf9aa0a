//! Extrusion waste breakdown scanner.
//!
//! Extrusion waste is reported as a trigger line ("Экструзия", "Экструдер 2")
//! optionally followed by soft/hard sub-lines:
//!
//! ```text
//! Экструзия
//! мягкие 3
//! т 2
//! ```
//!
//! The scanner walks forward from the trigger line and stops at the first line
//! that belongs to another section, at unrelated content, or when the
//! look-ahead budget of non-blank lines runs out.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::keywords::{KeywordFamily, KeywordMatcher};
use super::numbers::{first_number, round2, sum_numbers};
use super::patterns::{HARD_MARKER, SOFT_MARKER};

/// Default number of non-blank lines examined after the trigger.
pub const DEFAULT_LOOKAHEAD: usize = 8;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ScanningTriggerLine,
    ScanningSublines,
    Done,
}

/// Sub-line classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubLine {
    Soft,
    Hard,
    SectionStop,
    Unrelated,
}

/// Outcome of an extrusion scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtrusionScan {
    /// Extrusion waste, rounded to 2 decimal places.
    pub total: Decimal,
    /// Numbers found on the trigger line itself.
    pub trigger: Decimal,
    /// Sum of soft sub-lines.
    pub soft: Decimal,
    /// Sum of hard sub-lines.
    pub hard: Decimal,
    /// Index of the trigger line the scan started from.
    pub trigger_line: Option<usize>,
    /// Number of sub-lines consumed.
    pub sublines: usize,
    /// Whether the value came from the single-figure fallback.
    pub fallback: bool,
}

impl ExtrusionScan {
    /// Resolved value, if any.
    pub fn value(&self) -> Option<Decimal> {
        (!self.total.is_zero()).then_some(self.total)
    }
}

/// Scanner for the extrusion breakdown block.
#[derive(Debug, Clone)]
pub struct ExtrusionSubParser {
    matcher: KeywordMatcher,
    lookahead: usize,
}

impl ExtrusionSubParser {
    pub fn new() -> Self {
        Self {
            matcher: KeywordMatcher::new(),
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }

    /// Set the number of non-blank lines examined after the trigger.
    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Scan normalized message lines.
    pub fn scan(&self, lines: &[&str]) -> ExtrusionScan {
        let mut scan = ExtrusionScan::default();

        let triggers: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| self.matcher.matches(KeywordFamily::ExtrusionTrigger, line))
            .map(|(i, _)| i)
            .collect();

        let Some(&first_trigger) = triggers.first() else {
            return scan;
        };

        // Enter on the first trigger line that is not itself part of another section.
        let entry = triggers
            .iter()
            .copied()
            .find(|&i| !self.matcher.is_section_stop(lines[i]));

        if let Some(start) = entry {
            scan.trigger_line = Some(start);
            self.walk(lines, start, &mut scan);
        }

        scan.total = round2(scan.trigger + scan.soft + scan.hard);

        if scan.total.is_zero() {
            let line = lines[first_trigger];
            let after_keyword = self
                .matcher
                .keyword_end(KeywordFamily::ExtrusionTrigger, line)
                .map_or("", |end| &line[end..]);
            if let Some(value) = first_number(after_keyword) {
                debug!(line = first_trigger, %value, "extrusion fallback");
                scan.total = round2(value);
                scan.fallback = true;
            }
        }

        scan
    }

    fn walk(&self, lines: &[&str], start: usize, scan: &mut ExtrusionScan) {
        let mut state = ScanState::ScanningTriggerLine;
        let mut cursor = start;
        let mut budget = self.lookahead;

        while state != ScanState::Done {
            match state {
                ScanState::ScanningTriggerLine => {
                    scan.trigger = sum_numbers(lines[cursor]);
                    cursor += 1;
                    state = ScanState::ScanningSublines;
                }
                ScanState::ScanningSublines => {
                    let Some(line) = lines.get(cursor) else {
                        state = ScanState::Done;
                        continue;
                    };
                    cursor += 1;

                    if line.trim().is_empty() {
                        continue;
                    }
                    if budget == 0 {
                        state = ScanState::Done;
                        continue;
                    }
                    budget -= 1;

                    match self.classify(line) {
                        SubLine::Soft => {
                            scan.soft = round2(scan.soft + sum_numbers(line));
                            scan.sublines += 1;
                        }
                        SubLine::Hard => {
                            scan.hard = round2(scan.hard + sum_numbers(line));
                            scan.sublines += 1;
                        }
                        SubLine::SectionStop | SubLine::Unrelated => {
                            state = ScanState::Done;
                        }
                    }
                }
                ScanState::Done => {}
            }
        }

        debug!(
            trigger = %scan.trigger,
            soft = %scan.soft,
            hard = %scan.hard,
            sublines = scan.sublines,
            "extrusion scan finished"
        );
    }

    fn classify(&self, line: &str) -> SubLine {
        if self.matcher.is_section_stop(line) {
            SubLine::SectionStop
        } else if SOFT_MARKER.is_match(line) {
            SubLine::Soft
        } else if HARD_MARKER.is_match(line) {
            SubLine::Hard
        } else {
            SubLine::Unrelated
        }
    }
}

impl Default for ExtrusionSubParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn scan(text: &str) -> ExtrusionScan {
        let lines: Vec<&str> = text.lines().collect();
        ExtrusionSubParser::new().scan(&lines)
    }

    #[test]
    fn test_soft_and_hard_sublines() {
        let result = scan("экструзия\nмягкие 3\nтвердые 2");

        assert_eq!(result.total, d("5"));
        assert_eq!(result.soft, d("3"));
        assert_eq!(result.hard, d("2"));
        assert_eq!(result.sublines, 2);
        assert!(!result.fallback);
    }

    #[test]
    fn test_trigger_line_numbers_are_counted() {
        let result = scan("экструзия м 3,5 т 1,25");
        assert_eq!(result.total, d("4.75"));
        assert_eq!(result.sublines, 0);

        let result = scan("экструзия 4\nм 1");
        assert_eq!(result.total, d("5"));
    }

    #[test]
    fn test_section_stop_ends_scan() {
        let result = scan("экструзия\nвес 350\nмягкие 3");
        assert_eq!(result.value(), None);
    }

    #[test]
    fn test_unrelated_line_ends_scan() {
        let result = scan("экструзия\nм 3\nсмена прошла хорошо\nт 2");
        assert_eq!(result.total, d("3"));
    }

    #[test]
    fn test_blank_lines_are_free() {
        let result = scan("экструзия\n\n\nм 3\n   \nт 2");
        assert_eq!(result.total, d("5"));
    }

    #[test]
    fn test_lookahead_boundary() {
        let mut eighth = vec!["экструзия"];
        eighth.extend(std::iter::repeat_n("т 1", 7));
        eighth.push("м 10");
        let result = ExtrusionSubParser::new().scan(&eighth);
        assert_eq!(result.total, d("17"));

        let mut ninth = vec!["экструзия"];
        ninth.extend(std::iter::repeat_n("т 1", 8));
        ninth.push("м 10");
        let result = ExtrusionSubParser::new().scan(&ninth);
        assert_eq!(result.total, d("8"));
    }

    #[test]
    fn test_custom_lookahead() {
        let lines = ["экструзия", "м 1", "т 2"];
        let result = ExtrusionSubParser::new().with_lookahead(1).scan(&lines);
        assert_eq!(result.total, d("1"));
    }

    #[test]
    fn test_fallback_on_stop_trigger_line() {
        let result = scan("итого экструзия 10");
        assert_eq!(result.trigger_line, None);
        assert_eq!(result.total, d("10"));
        assert!(result.fallback);
    }

    #[test]
    fn test_fallback_reads_after_keyword() {
        let result = scan("флекса 5 экструзия 3");
        assert!(result.fallback);
        assert_eq!(result.total, d("3"));

        let result = scan("флекса 5 экструзия");
        assert_eq!(result.value(), None);
        assert!(!result.fallback);
    }

    #[test]
    fn test_no_trigger() {
        let result = scan("паков 120\nм 3");
        assert_eq!(result, ExtrusionScan::default());
    }

    #[test]
    fn test_trigger_without_numbers() {
        let result = scan("экструзия\nвсё хорошо");
        assert_eq!(result.value(), None);
        assert!(!result.fallback);
    }
}
