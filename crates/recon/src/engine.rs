use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, trace, warn};

use crate::audit::audit;
use crate::classify::HabitatClassifier;
use crate::config::RunConfig;
use crate::error::{IssueKind, RecordIssue};
use crate::evidence::compute_summary;
use crate::model::{ComparisonRecord, PairKey, RunInput, RunMeta, RunResult};
use crate::pairing::{intersected_by_existing, AnalysisContext};

/// Adjudicate every overlap in `input` per config. Never fails: record-level
/// problems end up in `RunResult::issues`.
pub fn run(config: &RunConfig, input: RunInput) -> RunResult {
    let classifier = HabitatClassifier::from_config(&config.classifier);
    let mut issues = input.load_issues.clone();

    // Barrier: the context is complete and frozen before any decision.
    let ctx = AnalysisContext::build(&input, &classifier, &mut issues);
    info!(
        intersection_rows = input.intersections.len(),
        pairs = ctx.pairs.len(),
        new_units = ctx.new_units.len(),
        existing_units = ctx.existing_units.len(),
        "analysis context built"
    );

    let comparisons = adjudicate_all(&ctx);
    for c in comparisons.iter().filter(|c| c.decision.is_pending()) {
        issues.push(RecordIssue::new(
            IssueKind::AmbiguousDecision,
            c.key().to_string(),
            format!("{} ({} vs {})", c.basis.as_str(), c.new.zone, c.existing.zone),
        ));
    }
    info!(comparisons = comparisons.len(), "pairs adjudicated");

    let metadata = audit(&ctx, &config.audit, &input.tracking);

    for issue in &issues {
        warn!(kind = %issue.kind, id = %issue.id, "{}", issue.detail);
    }

    let summary = compute_summary(
        input.intersections.len(),
        ctx.new_units.values(),
        ctx.existing_units.values(),
        &comparisons,
        &issues,
    );

    RunResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            input_hashes: BTreeMap::new(),
        },
        summary,
        comparisons,
        issues,
        audit: metadata,
        intersected: intersected_by_existing(&ctx.pairs),
    }
}

/// One comparison per pair, in sorted pair order.
fn adjudicate_all(ctx: &AnalysisContext) -> Vec<ComparisonRecord> {
    let keys: Vec<&PairKey> = ctx.pairs.iter().collect();

    #[cfg(feature = "parallel")]
    let iter = keys.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = keys.iter();

    iter.filter_map(|key| {
        let record = ctx.compare(key)?;
        trace!(pair = %key, decision = %record.decision, basis = record.basis.as_str(), "decided");
        Some(record)
    })
    .collect()
}
