//! Common regex patterns for shift report extraction.
//!
//! Every pattern runs against text that went through
//! [`normalize`](super::keywords::normalize), so stems are written lower-case
//! and with `е` in place of `ё`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Numbers: optional sign, thousands grouped by space / NBSP, decimal comma or point.
    // A grouped run must end on a word boundary so "12 3456" is not read as 12 345.
    pub static ref NUMBER_PATTERN: Regex = Regex::new(
        r"[+\-−]?(?:\d{1,3}(?:[ \u{00a0}]\d{3})+\b|\d+)(?:[.,]\d+)?"
    ).unwrap();

    // Extrusion sub-categories. Single letters only count when no letter touches them.
    pub static ref SOFT_MARKER: Regex = Regex::new(
        r"(?:^|\P{L})(?:мягк\p{L}*|мягч\p{L}*|мяг|м|m|soft)(?:\P{L}|$)"
    ).unwrap();

    pub static ref HARD_MARKER: Regex = Regex::new(
        r"(?:^|\P{L})(?:тверд\p{L}*|тв|т|t|hard|firm)(?:\P{L}|$)"
    ).unwrap();
}
