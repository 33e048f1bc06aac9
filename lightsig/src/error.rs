//! Error types for the scoring engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use instrument::InstrumentError;

/// Machine-readable error kind for status-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or incomplete input; the caller can re-prompt
    Validation,
    /// Broken reference data or config; a deployment defect
    Configuration,
    /// An internal invariant failed; a defect in the engine
    ComputationInvariant,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::ComputationInvariant => "computation_invariant",
        }
    }
}

/// An answer outside its question's scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfRange {
    pub question_id: String,
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

/// Every problem found in one response packet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Required questions with no answer
    pub missing: Vec<String>,
    /// Questions answered more than once
    pub duplicate: Vec<String>,
    /// Answers to ids not in the manifest
    pub unknown: Vec<String>,
    /// Answers outside the question's scale
    pub out_of_range: Vec<OutOfRange>,
    /// Subfacets with no answered baseline question (preview tier)
    pub uncovered_subfacets: Vec<String>,
    /// Load dimensions with no answered indicator (preview tier)
    pub uncovered_dimensions: Vec<String>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
            && self.duplicate.is_empty()
            && self.unknown.is_empty()
            && self.out_of_range.is_empty()
            && self.uncovered_subfacets.is_empty()
            && self.uncovered_dimensions.is_empty()
    }

    /// Total number of problems.
    pub fn problem_count(&self) -> usize {
        self.missing.len()
            + self.duplicate.len()
            + self.unknown.len()
            + self.out_of_range.len()
            + self.uncovered_subfacets.len()
            + self.uncovered_dimensions.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing [{}]", self.missing.join(", ")));
        }
        if !self.duplicate.is_empty() {
            parts.push(format!("duplicate [{}]", self.duplicate.join(", ")));
        }
        if !self.unknown.is_empty() {
            parts.push(format!("unknown [{}]", self.unknown.join(", ")));
        }
        if !self.out_of_range.is_empty() {
            let items: Vec<String> = self
                .out_of_range
                .iter()
                .map(|o| format!("{}={} not in {}..{}", o.question_id, o.value, o.min, o.max))
                .collect();
            parts.push(format!("out of range [{}]", items.join(", ")));
        }
        if !self.uncovered_subfacets.is_empty() {
            parts.push(format!(
                "uncovered subfacets [{}]",
                self.uncovered_subfacets.join(", ")
            ));
        }
        if !self.uncovered_dimensions.is_empty() {
            parts.push(format!(
                "uncovered load dimensions [{}]",
                self.uncovered_dimensions.join(", ")
            ));
        }
        f.write_str(&parts.join("; "))
    }
}

/// Error types for scoring operations.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Response packet is malformed or incomplete
    #[error("Validation error: {0}")]
    Validation(ValidationReport),

    /// Reference table or config is missing an expected entry
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A computed value broke a documented invariant
    #[error("Computation invariant violated: {0}")]
    ComputationInvariant(String),
}

impl ScoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ComputationInvariant(_) => ErrorKind::ComputationInvariant,
        }
    }

    /// The validation report, when this is a validation error.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}

impl From<InstrumentError> for ScoringError {
    fn from(err: InstrumentError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
