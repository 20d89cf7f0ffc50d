//! Confidence-metadata audit run before results are trusted.
//!
//! Three checks over the units actually involved in overlaps:
//! new units lacking a usable primary score, new units scored exactly 0,
//! and existing units absent from the confidence table. New units that only
//! overlap exempt (modelled) existing layers are not held to the first two.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::AuditConfig;
use crate::model::{AuditEntry, MetadataAudit, Presence, TrackingRow};
use crate::pairing::AnalysisContext;

pub fn audit(ctx: &AnalysisContext, config: &AuditConfig, tracking: &[TrackingRow]) -> MetadataAudit {
    let titles = title_index(tracking);
    let exempt: BTreeSet<&str> = config.exempt_existing.iter().map(|s| s.trim()).collect();

    let audited_new: BTreeSet<&str> = ctx
        .pairs
        .iter()
        .filter(|p| !exempt.contains(p.existing_id.as_str()))
        .map(|p| p.new_id.as_str())
        .collect();

    let mut report = MetadataAudit::default();

    for id in audited_new {
        // No row at all is reported as MissingConfidenceData, not here.
        let Some(row) = ctx.confidence.get(id) else {
            continue;
        };
        let Some(resolved) = ctx.confidence.resolve(id) else {
            continue;
        };
        let entry = AuditEntry {
            id: id.to_string(),
            title: titles.get(id).cloned(),
            primary: row.primary,
            secondary: row.secondary,
        };
        if resolved.presence == Presence::Missing {
            report.missing_primary.push(entry);
        } else if resolved.zero_flag {
            report.zero_primary.push(entry);
        }
    }

    let existing_ids: BTreeSet<&str> = ctx.pairs.iter().map(|p| p.existing_id.as_str()).collect();
    report.absent_existing = existing_ids
        .into_iter()
        .filter(|id| !ctx.confidence.contains(id))
        .map(|id| AuditEntry { id: id.to_string(), title: titles.get(id).cloned(), primary: None, secondary: None })
        .collect();

    if !report.is_clean() {
        tracing::warn!(
            missing_primary = report.missing_primary.len(),
            zero_primary = report.zero_primary.len(),
            absent_existing = report.absent_existing.len(),
            "confidence metadata incomplete"
        );
    }

    report
}

fn title_index(tracking: &[TrackingRow]) -> BTreeMap<&str, String> {
    let mut titles = BTreeMap::new();
    for row in tracking {
        let title = row.title.trim();
        if !title.is_empty() {
            titles.entry(row.id.trim()).or_insert_with(|| title.to_string());
        }
    }
    titles
}
