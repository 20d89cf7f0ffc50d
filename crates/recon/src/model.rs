use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::error::RecordIssue;

/// Confidence score with a total order. Scores are sanitized before they get
/// here (never NaN, never negative), so ordering and equality are plain.
pub type Score = OrderedFloat<f64>;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One raw overlap row: new unit `new_id` intersects existing unit `existing_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionRecord {
    pub new_id: String,
    pub existing_id: String,
}

impl IntersectionRecord {
    pub fn new(new_id: impl Into<String>, existing_id: impl Into<String>) -> Self {
        Self { new_id: new_id.into(), existing_id: existing_id.into() }
    }
}

/// One raw attribute row from either side's table. Many rows share an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRow {
    pub id: String,
    pub habitat: String,
    pub provenance: Option<String>,
}

impl AttributeRow {
    pub fn new(id: impl Into<String>, habitat: impl Into<String>) -> Self {
        Self { id: id.into(), habitat: habitat.into(), provenance: None }
    }

    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }
}

/// One confidence-table row. `None` means the cell was empty or a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceRow {
    pub id: String,
    pub primary: Option<f64>,
    pub secondary: Option<f64>,
}

impl ConfidenceRow {
    pub fn new(id: impl Into<String>, primary: Option<f64>, secondary: Option<f64>) -> Self {
        Self { id: id.into(), primary, secondary }
    }
}

/// Dataset title lookup row (survey tracking sheet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingRow {
    pub id: String,
    pub title: String,
}

/// Pre-loaded tables for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub intersections: Vec<IntersectionRecord>,
    pub new_attributes: Vec<AttributeRow>,
    pub existing_attributes: Vec<AttributeRow>,
    pub confidence: Vec<ConfidenceRow>,
    pub tracking: Vec<TrackingRow>,
    /// Problems already found while loading (unparsable scores, etc.).
    pub load_issues: Vec<RecordIssue>,
}

// ---------------------------------------------------------------------------
// Map units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Intertidal,
    SubTidal,
    Mixed,
    Error,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::Intertidal, Zone::SubTidal, Zone::Mixed, Zone::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intertidal => "intertidal",
            Self::SubTidal => "subtidal",
            Self::Mixed => "mixed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    Missing,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Missing => "missing",
        }
    }
}

/// Output of the confidence resolver for one map unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedConfidence {
    pub primary: Score,
    pub secondary: Score,
    pub presence: Presence,
    /// Primary score is exactly 0: possibly a data-entry placeholder.
    pub zero_flag: bool,
}

impl Default for ResolvedConfidence {
    fn default() -> Self {
        Self {
            primary: OrderedFloat(0.0),
            secondary: OrderedFloat(0.0),
            presence: Presence::Missing,
            zero_flag: false,
        }
    }
}

/// Habitat attributes of one id, aggregated over all of its source rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitAttributes {
    pub id: String,
    pub habitat_codes: BTreeSet<String>,
    pub zone: Zone,
    pub provenance: Option<String>,
    pub row_count: usize,
}

/// A fully resolved map unit: attributes plus confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapUnit {
    pub id: String,
    pub habitat_codes: BTreeSet<String>,
    pub zone: Zone,
    pub confidence: ResolvedConfidence,
    pub provenance: Option<String>,
}

impl MapUnit {
    pub fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            zone: self.zone,
            primary: self.confidence.primary,
            secondary: self.confidence.secondary,
            presence: self.confidence.presence,
            provenance: self.provenance.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pairs + decisions
// ---------------------------------------------------------------------------

/// Unique (new, existing) combination. Ordering drives output order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey {
    pub new_id: String,
    pub existing_id: String,
}

impl PairKey {
    pub fn new(new_id: impl Into<String>, existing_id: impl Into<String>) -> Self {
        Self { new_id: new_id.into(), existing_id: existing_id.into() }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.new_id, self.existing_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    WinnerIsNew,
    WinnerIsExisting,
    RequiresExpertJudgement,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WinnerIsNew => "winner_is_new",
            Self::WinnerIsExisting => "winner_is_existing",
            Self::RequiresExpertJudgement => "requires_expert_judgement",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::RequiresExpertJudgement)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule of the decision tree produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    NewIntertidal,
    ExistingIntertidal,
    PrimaryConfidence,
    SecondaryConfidence,
    ConfidenceTie,
    Unclassified,
}

impl DecisionBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewIntertidal => "new_intertidal",
            Self::ExistingIntertidal => "existing_intertidal",
            Self::PrimaryConfidence => "primary_confidence",
            Self::SecondaryConfidence => "secondary_confidence",
            Self::ConfidenceTie => "confidence_tie",
            Self::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub decision: Decision,
    pub basis: DecisionBasis,
}

/// The attributes the decision tree saw for one side of a pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSnapshot {
    pub zone: Zone,
    pub primary: Score,
    pub secondary: Score,
    pub presence: Presence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
}

/// Label written in place of a winner id when nobody wins automatically.
pub const EXPERT_JUDGEMENT_LABEL: &str = "Requires expert judgement";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub new_id: String,
    pub existing_id: String,
    pub new: UnitSnapshot,
    pub existing: UnitSnapshot,
    pub decision: Decision,
    pub basis: DecisionBasis,
}

impl ComparisonRecord {
    pub fn key(&self) -> PairKey {
        PairKey::new(self.new_id.clone(), self.existing_id.clone())
    }

    /// Winning map id, `None` while the pair waits for expert review.
    pub fn winner_id(&self) -> Option<&str> {
        match self.decision {
            Decision::WinnerIsNew => Some(&self.new_id),
            Decision::WinnerIsExisting => Some(&self.existing_id),
            Decision::RequiresExpertJudgement => None,
        }
    }

    pub fn result_label(&self) -> &str {
        self.winner_id().unwrap_or(EXPERT_JUDGEMENT_LABEL)
    }
}

// ---------------------------------------------------------------------------
// Metadata audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetadataAudit {
    /// New units with a confidence row but no usable primary score.
    pub missing_primary: Vec<AuditEntry>,
    /// New units whose primary score is exactly 0.
    pub zero_primary: Vec<AuditEntry>,
    /// Existing units in the pair set with no confidence row at all.
    pub absent_existing: Vec<AuditEntry>,
}

impl MetadataAudit {
    pub fn is_clean(&self) -> bool {
        self.missing_primary.is_empty() && self.zero_primary.is_empty() && self.absent_existing.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub intersection_rows: usize,
    pub pairs: usize,
    pub winner_is_new: usize,
    pub winner_is_existing: usize,
    pub requires_expert_judgement: usize,
    pub new_zone_counts: BTreeMap<String, usize>,
    pub existing_zone_counts: BTreeMap<String, usize>,
    pub issue_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    /// BLAKE3 of each input file, keyed by table name. Filled by the caller.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub input_hashes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub comparisons: Vec<ComparisonRecord>,
    pub issues: Vec<RecordIssue>,
    pub audit: MetadataAudit,
    /// existing id → the new ids overlapping it.
    pub intersected: BTreeMap<String, BTreeSet<String>>,
}

impl RunResult {
    /// Comparisons waiting on a human decision.
    pub fn review_queue(&self) -> Vec<&ComparisonRecord> {
        self.comparisons.iter().filter(|c| c.decision.is_pending()).collect()
    }
}
