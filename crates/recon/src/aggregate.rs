use std::collections::BTreeMap;

use crate::classify::HabitatClassifier;
use crate::error::{IssueKind, RecordIssue};
use crate::model::{AttributeRow, UnitAttributes, Zone};

/// Group attribute rows by id, union their cleaned habitat codes and zone
/// the result. Provenance is the first non-placeholder label seen.
pub fn aggregate_units(
    rows: &[AttributeRow],
    classifier: &HabitatClassifier,
) -> BTreeMap<String, UnitAttributes> {
    let mut groups: BTreeMap<String, UnitAttributes> = BTreeMap::new();

    for row in rows {
        let id = row.id.trim();
        if id.is_empty() || classifier.is_placeholder(id) {
            continue;
        }
        let entry = groups.entry(id.to_string()).or_insert_with(|| UnitAttributes {
            id: id.to_string(),
            habitat_codes: Default::default(),
            zone: Zone::Error,
            provenance: None,
            row_count: 0,
        });
        entry.row_count += 1;
        if !classifier.is_placeholder(&row.habitat) {
            entry.habitat_codes.insert(row.habitat.trim().to_string());
        }
        if entry.provenance.is_none() {
            entry.provenance = row
                .provenance
                .as_deref()
                .filter(|p| !classifier.is_placeholder(p))
                .map(|p| p.trim().to_string());
        }
    }

    for unit in groups.values_mut() {
        unit.zone = classifier.classify(unit.habitat_codes.iter().map(String::as_str));
    }

    groups
}

/// An id present in both attribute tables is reported, never merged: each
/// side keeps the codes and zone from its own rows.
pub fn report_cross_table_ids(
    new_units: &BTreeMap<String, UnitAttributes>,
    existing_units: &BTreeMap<String, UnitAttributes>,
    issues: &mut Vec<RecordIssue>,
) {
    for (id, new_unit) in new_units {
        let Some(existing_unit) = existing_units.get(id) else {
            continue;
        };
        issues.push(RecordIssue::new(
            IssueKind::DuplicateIdentifier,
            id,
            format!(
                "present in both attribute tables ({} new rows zoned {}, {} existing rows zoned {})",
                new_unit.row_count, new_unit.zone, existing_unit.row_count, existing_unit.zone
            ),
        ));
    }
}
