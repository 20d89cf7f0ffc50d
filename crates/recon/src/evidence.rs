use std::collections::BTreeMap;

use crate::error::RecordIssue;
use crate::model::{ComparisonRecord, Decision, MapUnit, RunSummary, Zone};

/// Compute summary statistics from adjudicated comparisons.
pub fn compute_summary<'a>(
    intersection_rows: usize,
    new_units: impl IntoIterator<Item = &'a MapUnit>,
    existing_units: impl IntoIterator<Item = &'a MapUnit>,
    comparisons: &[ComparisonRecord],
    issues: &[RecordIssue],
) -> RunSummary {
    let mut winner_is_new = 0;
    let mut winner_is_existing = 0;
    let mut requires_expert_judgement = 0;

    for c in comparisons {
        match c.decision {
            Decision::WinnerIsNew => winner_is_new += 1,
            Decision::WinnerIsExisting => winner_is_existing += 1,
            Decision::RequiresExpertJudgement => requires_expert_judgement += 1,
        }
    }

    let mut issue_counts: BTreeMap<String, usize> = BTreeMap::new();
    for issue in issues {
        *issue_counts.entry(issue.kind.to_string()).or_insert(0) += 1;
    }

    RunSummary {
        intersection_rows,
        pairs: comparisons.len(),
        winner_is_new,
        winner_is_existing,
        requires_expert_judgement,
        new_zone_counts: zone_counts(new_units),
        existing_zone_counts: zone_counts(existing_units),
        issue_counts,
    }
}

/// Unit count per zone; every zone appears, zero or not.
fn zone_counts<'a>(units: impl IntoIterator<Item = &'a MapUnit>) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = Zone::ALL.iter().map(|z| (z.to_string(), 0)).collect();
    for unit in units {
        *counts.entry(unit.zone.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueKind;
    use crate::model::{DecisionBasis, ResolvedConfidence};

    fn unit(id: &str, zone: Zone) -> MapUnit {
        MapUnit {
            id: id.into(),
            habitat_codes: Default::default(),
            zone,
            confidence: ResolvedConfidence::default(),
            provenance: None,
        }
    }

    fn comparison(decision: Decision) -> ComparisonRecord {
        let u = unit("x", Zone::SubTidal);
        ComparisonRecord {
            new_id: "n".into(),
            existing_id: "e".into(),
            new: u.snapshot(),
            existing: u.snapshot(),
            decision,
            basis: DecisionBasis::PrimaryConfidence,
        }
    }

    #[test]
    fn summary_counts() {
        let new_units = vec![unit("GB1", Zone::SubTidal), unit("GB2", Zone::Mixed), unit("GB3", Zone::SubTidal)];
        let existing_units = vec![unit("UKSM", Zone::SubTidal)];
        let comparisons = vec![
            comparison(Decision::WinnerIsNew),
            comparison(Decision::WinnerIsNew),
            comparison(Decision::RequiresExpertJudgement),
        ];
        let issues = vec![
            RecordIssue::new(IssueKind::AmbiguousDecision, "GB2|UKSM", "tie"),
            RecordIssue::new(IssueKind::MissingConfidenceData, "GB3", "no row"),
            RecordIssue::new(IssueKind::MissingConfidenceData, "UKSM", "no row"),
        ];

        let s = compute_summary(5, &new_units, &existing_units, &comparisons, &issues);
        assert_eq!(s.intersection_rows, 5);
        assert_eq!(s.pairs, 3);
        assert_eq!(s.winner_is_new, 2);
        assert_eq!(s.winner_is_existing, 0);
        assert_eq!(s.requires_expert_judgement, 1);
        assert_eq!(s.new_zone_counts["subtidal"], 2);
        assert_eq!(s.new_zone_counts["intertidal"], 0);
        assert_eq!(s.existing_zone_counts["subtidal"], 1);
        assert_eq!(s.issue_counts["missing_confidence_data"], 2);
    }
}
