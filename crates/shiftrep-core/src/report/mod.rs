//! Shift report field extraction.

mod parser;
pub mod rules;

pub use parser::{LineReportParser, ParseResult, ReportDecision, ReportParser, DEFAULT_MIN_FIELDS};
