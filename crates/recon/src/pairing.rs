//! Pair derivation and the analysis context the decision tree reads from.

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::{aggregate_units, report_cross_table_ids};
use crate::classify::HabitatClassifier;
use crate::confidence::ConfidenceIndex;
use crate::decision::adjudicate;
use crate::error::{IssueKind, RecordIssue};
use crate::model::{
    ComparisonRecord, IntersectionRecord, MapUnit, PairKey, ResolvedConfidence, RunInput,
    UnitAttributes, Zone,
};

/// Deduplicate raw overlap rows into the set of unique (new, existing) pairs.
///
/// Rows with a blank or placeholder id on either side cannot be paired and
/// are reported as `BlankIdentifier`; the rest of the batch continues.
pub fn build_pairs(
    records: &[IntersectionRecord],
    classifier: &HabitatClassifier,
    issues: &mut Vec<RecordIssue>,
) -> BTreeSet<PairKey> {
    let mut pairs = BTreeSet::new();
    for (idx, record) in records.iter().enumerate() {
        let new_id = record.new_id.trim();
        let existing_id = record.existing_id.trim();
        let new_blank = new_id.is_empty() || classifier.is_placeholder(new_id);
        let existing_blank = existing_id.is_empty() || classifier.is_placeholder(existing_id);
        if new_blank || existing_blank {
            let id = if new_blank { existing_id } else { new_id };
            issues.push(RecordIssue::new(
                IssueKind::BlankIdentifier,
                id,
                format!("intersection row {}: missing {} id", idx + 1, if new_blank { "new" } else { "existing" }),
            ));
            continue;
        }
        pairs.insert(PairKey::new(new_id, existing_id));
    }
    pairs
}

/// Group the pair set by existing id: which new maps overlap each existing map.
pub fn intersected_by_existing(pairs: &BTreeSet<PairKey>) -> BTreeMap<String, BTreeSet<String>> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for pair in pairs {
        grouped.entry(pair.existing_id.clone()).or_default().insert(pair.new_id.clone());
    }
    grouped
}

/// Ids listed in `reference` that the combined map does not contain yet.
pub fn new_map_ids<'a, R, C>(reference: R, combined: C) -> BTreeSet<String>
where
    R: IntoIterator<Item = &'a str>,
    C: IntoIterator<Item = &'a str>,
{
    let combined: BTreeSet<&str> = combined.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect();
    reference
        .into_iter()
        .map(str::trim)
        .filter(|id| !id.is_empty() && !combined.contains(id))
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    New,
    Existing,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::New => "new",
            Side::Existing => "existing",
        }
    }
}

/// Every map unit a run needs, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub pairs: BTreeSet<PairKey>,
    pub new_units: BTreeMap<String, MapUnit>,
    pub existing_units: BTreeMap<String, MapUnit>,
    pub confidence: ConfidenceIndex,
}

impl AnalysisContext {
    pub fn build(input: &RunInput, classifier: &HabitatClassifier, issues: &mut Vec<RecordIssue>) -> Self {
        let pairs = build_pairs(&input.intersections, classifier, issues);

        let new_attrs = aggregate_units(&input.new_attributes, classifier);
        let existing_attrs = aggregate_units(&input.existing_attributes, classifier);
        report_cross_table_ids(&new_attrs, &existing_attrs, issues);

        let confidence = ConfidenceIndex::build(&input.confidence, issues);

        let new_ids: BTreeSet<&str> = pairs.iter().map(|p| p.new_id.as_str()).collect();
        let existing_ids: BTreeSet<&str> = pairs.iter().map(|p| p.existing_id.as_str()).collect();

        let new_units = new_ids
            .into_iter()
            .map(|id| (id.to_string(), attach(Side::New, id, new_attrs.get(id), &confidence, issues)))
            .collect();
        let existing_units = existing_ids
            .into_iter()
            .map(|id| (id.to_string(), attach(Side::Existing, id, existing_attrs.get(id), &confidence, issues)))
            .collect();

        Self { pairs, new_units, existing_units, confidence }
    }

    /// Adjudicate one pair. `None` only if the pair is not part of this context.
    pub fn compare(&self, key: &PairKey) -> Option<ComparisonRecord> {
        if !self.pairs.contains(key) {
            return None;
        }
        let new = self.new_units.get(&key.new_id)?;
        let existing = self.existing_units.get(&key.existing_id)?;
        let verdict = adjudicate(new.into(), existing.into());
        Some(ComparisonRecord {
            new_id: key.new_id.clone(),
            existing_id: key.existing_id.clone(),
            new: new.snapshot(),
            existing: existing.snapshot(),
            decision: verdict.decision,
            basis: verdict.basis,
        })
    }
}

fn attach(
    side: Side,
    id: &str,
    attrs: Option<&UnitAttributes>,
    confidence: &ConfidenceIndex,
    issues: &mut Vec<RecordIssue>,
) -> MapUnit {
    let (habitat_codes, zone, provenance) = match attrs {
        Some(a) => (a.habitat_codes.clone(), a.zone, a.provenance.clone()),
        None => {
            issues.push(RecordIssue::new(
                IssueKind::MissingAttributes,
                id,
                format!("{} unit has no attribute rows", side.label()),
            ));
            (BTreeSet::new(), Zone::Error, None)
        }
    };

    if zone == Zone::Error && attrs.is_some() {
        let codes: Vec<&str> = habitat_codes.iter().map(String::as_str).collect();
        issues.push(RecordIssue::new(
            IssueKind::UnclassifiableHabitat,
            id,
            format!("{} unit habitat codes [{}] match no zone", side.label(), codes.join(", ")),
        ));
    }

    let resolved = match confidence.resolve(id) {
        Some(c) => c,
        None => {
            issues.push(RecordIssue::new(
                IssueKind::MissingConfidenceData,
                id,
                format!("{} unit has no confidence row; scores default to 0", side.label()),
            ));
            ResolvedConfidence::default()
        }
    };

    MapUnit { id: id.to_string(), habitat_codes, zone, confidence: resolved, provenance }
}
