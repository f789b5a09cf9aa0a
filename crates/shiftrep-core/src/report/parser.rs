//! Shift report parser and acceptance policy.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::models::config::ParserConfig;
use crate::models::report::{Field, FieldMap};

use super::rules::{
    extrusion::{ExtrusionScan, ExtrusionSubParser, DEFAULT_LOOKAHEAD},
    keywords::{normalize, KeywordFamily, KeywordMatcher},
    numbers::scan_numbers,
};

/// Default minimum number of non-zero fields for a report.
pub const DEFAULT_MIN_FIELDS: usize = 3;

/// Fields read from keyword lines.
const LINE_FIELDS: [Field; 4] = [
    Field::Pieces,
    Field::Weight,
    Field::SealWaste,
    Field::FlexoWaste,
];

/// Whether a parsed message counts as a shift report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ReportDecision {
    /// Completed field map: defaults filled, total recomputed.
    Accepted(FieldMap),
    /// Too few non-zero fields.
    Rejected { populated: usize },
}

impl ReportDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ReportDecision::Accepted(_))
    }

    pub fn into_fields(self) -> Option<FieldMap> {
        match self {
            ReportDecision::Accepted(fields) => Some(fields),
            ReportDecision::Rejected { .. } => None,
        }
    }
}

/// Detailed result of parsing one message.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// Raw field map, before acceptance.
    pub fields: FieldMap,
    /// Extrusion scan details.
    pub extrusion: ExtrusionScan,
    /// Acceptance decision.
    pub decision: ReportDecision,
    /// Processing time in microseconds.
    pub processing_time_us: u64,
}

/// Trait for report parsing.
pub trait ReportParser {
    /// Extract the raw field map from message text. Never fails.
    fn parse(&self, text: &str) -> FieldMap;

    /// Apply the acceptance policy to a raw field map.
    fn evaluate(&self, fields: FieldMap) -> ReportDecision;

    /// Parse and evaluate in one step.
    fn parse_report(&self, text: &str) -> ReportDecision {
        self.evaluate(self.parse(text))
    }
}

/// Keyword/line based report parser.
#[derive(Debug, Clone)]
pub struct LineReportParser {
    matcher: KeywordMatcher,
    extrusion: ExtrusionSubParser,
    /// Minimum number of non-zero fields to accept a report.
    min_fields: usize,
}

impl LineReportParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self {
            matcher: KeywordMatcher::new(),
            extrusion: ExtrusionSubParser::new().with_lookahead(DEFAULT_LOOKAHEAD),
            min_fields: DEFAULT_MIN_FIELDS,
        }
    }

    /// Create a parser from configuration.
    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new()
            .with_min_fields(config.min_fields)
            .with_extrusion_lookahead(config.extrusion_lookahead)
    }

    /// Set the acceptance threshold.
    pub fn with_min_fields(mut self, min_fields: usize) -> Self {
        self.min_fields = min_fields;
        self
    }

    /// Set the extrusion look-ahead budget.
    pub fn with_extrusion_lookahead(mut self, lookahead: usize) -> Self {
        self.extrusion = self.extrusion.with_lookahead(lookahead);
        self
    }

    /// Parse with extrusion details and the acceptance decision.
    pub fn parse_detailed(&self, text: &str) -> ParseResult {
        let start = Instant::now();
        let (fields, extrusion) = self.extract(text);
        let decision = self.evaluate(fields.clone());

        ParseResult {
            fields,
            extrusion,
            decision,
            processing_time_us: start.elapsed().as_micros() as u64,
        }
    }

    fn extract(&self, text: &str) -> (FieldMap, ExtrusionScan) {
        let normalized = normalize(text);
        let lines: Vec<&str> = normalized.lines().collect();
        let mut fields = FieldMap::new();

        for field in LINE_FIELDS {
            for (index, line) in lines.iter().enumerate() {
                if !self.matcher.matches_field(field, line) {
                    continue;
                }
                let numbers = scan_numbers(line);
                if numbers.is_empty() {
                    continue;
                }
                let sum: Decimal = numbers.into_iter().sum();
                debug!(%field, line = index, value = %sum, "field line");
                fields.add(field, sum);
            }
        }

        let mut extrusion = ExtrusionScan::default();
        if lines
            .iter()
            .any(|line| self.matcher.matches(KeywordFamily::ExtrusionTrigger, line))
        {
            extrusion = self.extrusion.scan(&lines);
            if let Some(value) = extrusion.value() {
                fields.insert(Field::ExtrusionWaste, value);
            }
        }

        if !fields.has_nonzero() {
            return (FieldMap::new(), extrusion);
        }

        (fields, extrusion)
    }
}

impl Default for LineReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser for LineReportParser {
    fn parse(&self, text: &str) -> FieldMap {
        self.extract(text).0
    }

    fn evaluate(&self, mut fields: FieldMap) -> ReportDecision {
        // A typed total never counts towards acceptance and never survives it.
        fields.remove(Field::TotalWaste);

        let populated = fields.populated();
        if populated < self.min_fields {
            debug!(populated, required = self.min_fields, "message rejected");
            return ReportDecision::Rejected { populated };
        }

        fields.fill_defaults();
        fields.recompute_total();

        info!(populated, total = %fields.value(Field::TotalWaste), "report accepted");
        ReportDecision::Accepted(fields)
    }
}
