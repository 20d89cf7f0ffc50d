//! Confidence resolution: primary ("3-step") and secondary ("MESH") scores.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::error::{IssueKind, RecordIssue};
use crate::model::{ConfidenceRow, Presence, ResolvedConfidence};

/// Normalize one unit's raw scores.
///
/// A primary score counts as present only when it is a non-negative number;
/// anything else resolves to 0 with `Presence::Missing`. Secondary falls back
/// to 0 the same way. A primary of exactly 0 is kept but flagged.
pub fn resolve(primary_raw: Option<f64>, secondary_raw: Option<f64>) -> ResolvedConfidence {
    let primary = primary_raw.filter(|v| is_valid(*v));
    let secondary = secondary_raw.filter(|v| is_valid(*v)).unwrap_or(0.0);

    match primary {
        Some(p) => ResolvedConfidence {
            primary: OrderedFloat(p),
            secondary: OrderedFloat(secondary),
            presence: Presence::Present,
            zero_flag: p == 0.0,
        },
        None => ResolvedConfidence {
            primary: OrderedFloat(0.0),
            secondary: OrderedFloat(secondary),
            presence: Presence::Missing,
            zero_flag: false,
        },
    }
}

fn is_valid(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// Confidence rows indexed by id. First row wins for repeated ids.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceIndex {
    rows: BTreeMap<String, ConfidenceRow>,
}

impl ConfidenceIndex {
    pub fn build(rows: &[ConfidenceRow], issues: &mut Vec<RecordIssue>) -> Self {
        let mut index: BTreeMap<String, ConfidenceRow> = BTreeMap::new();
        for row in rows {
            let id = row.id.trim();
            if id.is_empty() {
                continue;
            }
            if index.contains_key(id) {
                issues.push(RecordIssue::new(
                    IssueKind::DuplicateIdentifier,
                    id,
                    "repeated confidence row; first row kept",
                ));
                continue;
            }
            for (label, value) in [("primary", row.primary), ("secondary", row.secondary)] {
                if let Some(v) = value.filter(|v| !is_valid(*v)) {
                    issues.push(RecordIssue::new(
                        IssueKind::InvalidScore,
                        id,
                        format!("{label} score {v} is not a non-negative number; treated as missing"),
                    ));
                }
            }
            index.insert(id.to_string(), row.clone());
        }
        Self { rows: index }
    }

    pub fn get(&self, id: &str) -> Option<&ConfidenceRow> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// Resolved scores for `id`, or `None` when the id has no row.
    pub fn resolve(&self, id: &str) -> Option<ResolvedConfidence> {
        self.rows.get(id).map(|r| resolve(r.primary, r.secondary))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_scores_pass_through() {
        let c = resolve(Some(5.0), Some(2.0));
        assert_eq!(c.presence, Presence::Present);
        assert_eq!(c.primary, OrderedFloat(5.0));
        assert_eq!(c.secondary, OrderedFloat(2.0));
        assert!(!c.zero_flag);
    }

    #[test]
    fn absent_primary_defaults_to_zero_and_missing() {
        let c = resolve(None, Some(3.5));
        assert_eq!(c.presence, Presence::Missing);
        assert_eq!(c.primary, OrderedFloat(0.0));
        assert_eq!(c.secondary, OrderedFloat(3.5));
        assert!(!c.zero_flag);
    }

    #[test]
    fn absent_secondary_defaults_to_zero() {
        let c = resolve(Some(4.0), None);
        assert_eq!(c.secondary, OrderedFloat(0.0));
    }

    #[test]
    fn zero_primary_is_flagged_not_altered() {
        let c = resolve(Some(0.0), None);
        assert_eq!(c.presence, Presence::Present);
        assert_eq!(c.primary, OrderedFloat(0.0));
        assert!(c.zero_flag);
    }

    #[test]
    fn negative_or_nan_is_missing() {
        assert_eq!(resolve(Some(-1.0), None).presence, Presence::Missing);
        assert_eq!(resolve(Some(f64::NAN), None).presence, Presence::Missing);
        assert_eq!(resolve(Some(1.0), Some(-2.0)).secondary, OrderedFloat(0.0));
    }

    #[test]
    fn index_keeps_first_row_and_reports_duplicates() {
        let rows = vec![
            ConfidenceRow::new("GB0001", Some(5.0), Some(2.0)),
            ConfidenceRow::new("GB0001", Some(1.0), Some(1.0)),
            ConfidenceRow::new("GB0002", Some(-3.0), None),
        ];
        let mut issues = Vec::new();
        let index = ConfidenceIndex::build(&rows, &mut issues);

        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve("GB0001").unwrap().primary, OrderedFloat(5.0));
        assert_eq!(index.resolve("GB0002").unwrap().presence, Presence::Missing);
        assert!(index.resolve("GB9999").is_none());

        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::DuplicateIdentifier, IssueKind::InvalidScore]);
    }
}
