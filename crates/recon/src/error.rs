use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Fatal errors. Anything that concerns a single map unit or pair is an
/// [`RecordIssue`] instead and never aborts the run.
#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty token list, overlapping groups, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A table section references a column name that is blank.
    #[error("table '{table}': column mapping '{field}' is empty")]
    EmptyColumn { table: String, field: String },
}

// ---------------------------------------------------------------------------
// Per-record issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// No confidence row for the id; both scores default to zero.
    MissingConfidenceData,
    /// No habitat code matched a known group; the unit is zoned `Error`.
    UnclassifiableHabitat,
    /// Same id aggregated from both attribute tables, or repeated in the
    /// confidence table.
    DuplicateIdentifier,
    /// Pair could not be decided automatically and sits in the review queue.
    AmbiguousDecision,
    /// An id referenced by an intersection has no attribute rows at all.
    MissingAttributes,
    /// Intersection row with an empty or placeholder identifier.
    BlankIdentifier,
    /// Score cell that is neither empty nor a non-negative number.
    InvalidScore,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingConfidenceData => "missing_confidence_data",
            Self::UnclassifiableHabitat => "unclassifiable_habitat",
            Self::DuplicateIdentifier => "duplicate_identifier",
            Self::AmbiguousDecision => "ambiguous_decision",
            Self::MissingAttributes => "missing_attributes",
            Self::BlankIdentifier => "blank_identifier",
            Self::InvalidScore => "invalid_score",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured, recoverable problem, reported in the issues table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RecordIssue {
    pub kind: IssueKind,
    /// Map unit id, or `new|existing` for pair-level issues.
    pub id: String,
    pub detail: String,
}

impl RecordIssue {
    pub fn new(kind: IssueKind, id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { kind, id: id.into(), detail: detail.into() }
    }
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.kind, self.id, self.detail)
    }
}
