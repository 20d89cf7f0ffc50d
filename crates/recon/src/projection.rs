//! Decision lookups consumed by the downstream erase step.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{ComparisonRecord, Decision, PairKey, EXPERT_JUDGEMENT_LABEL};

/// One row of the join table handed back to the GIS layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinRow {
    pub new_id: String,
    pub existing_id: String,
    /// Winning id, or the expert-judgement label.
    pub result: String,
}

/// Every adjudicated pair keyed by (new, existing), exactly once.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    decisions: BTreeMap<PairKey, Decision>,
}

impl Projection {
    pub fn from_comparisons(comparisons: &[ComparisonRecord]) -> Self {
        let decisions = comparisons.iter().map(|c| (c.key(), c.decision)).collect();
        Self { decisions }
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn decision(&self, new_id: &str, existing_id: &str) -> Option<Decision> {
        self.decisions.get(&PairKey::new(new_id, existing_id)).copied()
    }

    /// Existing units that lost their overlap with `new_id`.
    pub fn losers(&self, new_id: &str) -> BTreeSet<String> {
        self.decisions
            .iter()
            .filter(|(k, d)| k.new_id == new_id && **d == Decision::WinnerIsNew)
            .map(|(k, _)| k.existing_id.clone())
            .collect()
    }

    /// Winning id for every automatically decided pair.
    pub fn winners(&self) -> BTreeMap<PairKey, String> {
        self.decisions
            .iter()
            .filter_map(|(k, d)| {
                let winner = match d {
                    Decision::WinnerIsNew => &k.new_id,
                    Decision::WinnerIsExisting => &k.existing_id,
                    Decision::RequiresExpertJudgement => return None,
                };
                Some((k.clone(), winner.clone()))
            })
            .collect()
    }

    /// Pairs held back for expert review.
    pub fn pending(&self) -> Vec<&PairKey> {
        self.decisions.iter().filter(|(_, d)| d.is_pending()).map(|(k, _)| k).collect()
    }

    /// Overlaps to erase from the new maps: the existing unit won.
    /// Pending pairs are never included.
    pub fn erase_from_new(&self) -> Vec<&PairKey> {
        self.decisions
            .iter()
            .filter(|(_, d)| **d == Decision::WinnerIsExisting)
            .map(|(k, _)| k)
            .collect()
    }

    pub fn join_rows(&self) -> Vec<JoinRow> {
        let winners = self.winners();
        self.decisions
            .keys()
            .map(|k| JoinRow {
                new_id: k.new_id.clone(),
                existing_id: k.existing_id.clone(),
                result: winners
                    .get(k)
                    .cloned()
                    .unwrap_or_else(|| EXPERT_JUDGEMENT_LABEL.to_string()),
            })
            .collect()
    }
}
