//! Output tables. Rows are written in the order the engine produced them
//! (sorted by pair), with `\n` line endings so reruns diff cleanly.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use combmap_recon::model::{AuditEntry, ComparisonRecord, RunResult, UnitSnapshot};
use combmap_recon::Projection;

use crate::TableError;

pub const COMPARISONS_FILE: &str = "comparisons.csv";
pub const REVIEW_QUEUE_FILE: &str = "review_queue.csv";
pub const JOIN_RESULTS_FILE: &str = "join_results.csv";
pub const ERASE_FROM_NEW_FILE: &str = "erase_from_new.csv";
pub const ISSUES_FILE: &str = "issues.csv";
pub const INTERSECTED_FILE: &str = "intersected_maps.csv";
pub const MISSING_PRIMARY_FILE: &str = "missing_primary_confidence.csv";
pub const ZERO_PRIMARY_FILE: &str = "zero_primary_confidence.csv";
pub const ABSENT_EXISTING_FILE: &str = "absent_from_confidence.csv";

const COMPARISON_HEADER: &[&str] = &[
    "new_id",
    "existing_id",
    "new_zone",
    "new_primary",
    "new_secondary",
    "new_confidence",
    "new_provenance",
    "existing_zone",
    "existing_primary",
    "existing_secondary",
    "existing_confidence",
    "existing_provenance",
    "decision",
    "basis",
    "result",
];

const AUDIT_HEADER: &[&str] = &["id", "title", "primary", "secondary"];

/// Write every output table for `result` into `dir` (created if needed).
/// Audit tables are only written when they have rows. Returns the paths written.
pub fn write_run_outputs(result: &RunResult, dir: &Path) -> Result<Vec<PathBuf>, TableError> {
    std::fs::create_dir_all(dir).map_err(|source| TableError::Write { path: dir.to_path_buf(), source })?;

    let projection = Projection::from_comparisons(&result.comparisons);
    let review: Vec<&ComparisonRecord> = result.review_queue();
    let mut written = Vec::new();

    let mut emit = |name: &str, f: &dyn Fn(&mut dyn Write) -> Result<(), TableError>| -> Result<(), TableError> {
        let path = dir.join(name);
        let mut file = File::create(&path).map_err(|source| TableError::Write { path: path.clone(), source })?;
        f(&mut file)?;
        tracing::debug!(path = %path.display(), "wrote table");
        written.push(path);
        Ok(())
    };

    emit(COMPARISONS_FILE, &|w| write_comparisons_csv(result.comparisons.iter(), w))?;
    emit(REVIEW_QUEUE_FILE, &|w| write_comparisons_csv(review.iter().copied(), w))?;
    emit(JOIN_RESULTS_FILE, &|w| write_join_results_csv(&projection, w))?;
    emit(ERASE_FROM_NEW_FILE, &|w| write_erase_csv(&projection, w))?;
    emit(ISSUES_FILE, &|w| write_issues_csv(result, w))?;
    emit(INTERSECTED_FILE, &|w| write_intersected_csv(result, w))?;

    for (name, entries) in [
        (MISSING_PRIMARY_FILE, &result.audit.missing_primary),
        (ZERO_PRIMARY_FILE, &result.audit.zero_primary),
        (ABSENT_EXISTING_FILE, &result.audit.absent_existing),
    ] {
        if !entries.is_empty() {
            emit(name, &|w| write_audit_csv(entries, w))?;
        }
    }

    Ok(written)
}

pub fn write_comparisons_csv<'a>(
    comparisons: impl Iterator<Item = &'a ComparisonRecord>,
    writer: &mut dyn Write,
) -> Result<(), TableError> {
    let mut csv = csv_writer(writer);
    csv.write_record(COMPARISON_HEADER).map_err(|e| TableError::csv("comparisons", e))?;

    for c in comparisons {
        let mut record: Vec<String> = vec![c.new_id.clone(), c.existing_id.clone()];
        record.extend(snapshot_fields(&c.new));
        record.extend(snapshot_fields(&c.existing));
        record.push(c.decision.as_str().to_string());
        record.push(c.basis.as_str().to_string());
        record.push(c.result_label().to_string());
        csv.write_record(&record).map_err(|e| TableError::csv("comparisons", e))?;
    }

    csv.flush().map_err(|e| TableError::csv("comparisons", e.into()))
}

pub fn write_join_results_csv(projection: &Projection, writer: &mut dyn Write) -> Result<(), TableError> {
    let mut csv = csv_writer(writer);
    csv.write_record(["new_id", "existing_id", "result"]).map_err(|e| TableError::csv("join_results", e))?;
    for row in projection.join_rows() {
        csv.write_record([row.new_id.as_str(), row.existing_id.as_str(), row.result.as_str()])
            .map_err(|e| TableError::csv("join_results", e))?;
    }
    csv.flush().map_err(|e| TableError::csv("join_results", e.into()))
}

/// Overlaps the existing map won; these areas are erased from the new maps.
pub fn write_erase_csv(projection: &Projection, writer: &mut dyn Write) -> Result<(), TableError> {
    let mut csv = csv_writer(writer);
    csv.write_record(["new_id", "existing_id"]).map_err(|e| TableError::csv("erase_from_new", e))?;
    for key in projection.erase_from_new() {
        csv.write_record([key.new_id.as_str(), key.existing_id.as_str()]).map_err(|e| TableError::csv("erase_from_new", e))?;
    }
    csv.flush().map_err(|e| TableError::csv("erase_from_new", e.into()))
}

pub fn write_issues_csv(result: &RunResult, writer: &mut dyn Write) -> Result<(), TableError> {
    let mut csv = csv_writer(writer);
    csv.write_record(["kind", "id", "detail"]).map_err(|e| TableError::csv("issues", e))?;
    for issue in &result.issues {
        csv.write_record([issue.kind.as_str(), issue.id.as_str(), issue.detail.as_str()])
            .map_err(|e| TableError::csv("issues", e))?;
    }
    csv.flush().map_err(|e| TableError::csv("issues", e.into()))
}

/// One row per existing map: the new maps overlapping it, `;`-separated.
pub fn write_intersected_csv(result: &RunResult, writer: &mut dyn Write) -> Result<(), TableError> {
    let mut csv = csv_writer(writer);
    csv.write_record(["existing_id", "new_ids", "count"]).map_err(|e| TableError::csv("intersected_maps", e))?;
    for (existing, new_ids) in &result.intersected {
        let joined = new_ids.iter().map(String::as_str).collect::<Vec<_>>().join(";");
        csv.write_record([existing.clone(), joined, new_ids.len().to_string()])
            .map_err(|e| TableError::csv("intersected_maps", e))?;
    }
    csv.flush().map_err(|e| TableError::csv("intersected_maps", e.into()))
}

pub fn write_audit_csv(entries: &[AuditEntry], writer: &mut dyn Write) -> Result<(), TableError> {
    let mut csv = csv_writer(writer);
    csv.write_record(AUDIT_HEADER).map_err(|e| TableError::csv("audit", e))?;
    for e in entries {
        csv.write_record([
            e.id.clone(),
            e.title.clone().unwrap_or_default(),
            e.primary.map(format_score).unwrap_or_default(),
            e.secondary.map(format_score).unwrap_or_default(),
        ])
        .map_err(|err| TableError::csv("audit", err))?;
    }
    csv.flush().map_err(|e| TableError::csv("audit", e.into()))
}

fn csv_writer(writer: &mut dyn Write) -> csv::Writer<&mut dyn Write> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn snapshot_fields(s: &UnitSnapshot) -> [String; 5] {
    [
        s.zone.as_str().to_string(),
        format_score(s.primary.into_inner()),
        format_score(s.secondary.into_inner()),
        s.presence.as_str().to_string(),
        s.provenance.clone().unwrap_or_default(),
    ]
}

fn format_score(v: f64) -> String {
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use combmap_recon::model::{Decision, DecisionBasis, Presence, RunMeta, RunSummary, Score, Zone};

    fn snapshot(zone: Zone, primary: f64, secondary: f64, presence: Presence) -> UnitSnapshot {
        UnitSnapshot { zone, primary: Score::from(primary), secondary: Score::from(secondary), presence, provenance: None }
    }

    fn comparison(n: &str, e: &str, decision: Decision) -> ComparisonRecord {
        ComparisonRecord {
            new_id: n.into(),
            existing_id: e.into(),
            new: snapshot(Zone::SubTidal, 5.0, 2.0, Presence::Present),
            existing: snapshot(Zone::SubTidal, 5.0, 1.5, Presence::Missing),
            decision,
            basis: DecisionBasis::SecondaryConfidence,
        }
    }

    fn result() -> RunResult {
        RunResult {
            meta: RunMeta {
                config_name: "t".into(),
                engine_version: "0".into(),
                run_at: "2026-01-01T00:00:00Z".into(),
                input_hashes: Default::default(),
            },
            summary: RunSummary::default(),
            comparisons: vec![
                comparison("GB1", "UKSM", Decision::WinnerIsNew),
                comparison("GB2", "GB9", Decision::WinnerIsExisting),
                comparison("GB3", "GB9", Decision::RequiresExpertJudgement),
            ],
            issues: vec![],
            audit: Default::default(),
            intersected: [("GB9".to_string(), ["GB2".to_string(), "GB3".to_string()].into())].into(),
        }
    }

    fn render(f: impl Fn(&mut dyn Write) -> Result<(), TableError>) -> String {
        let mut buf: Vec<u8> = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn comparison_rows() {
        let r = result();
        let out = render(|w| write_comparisons_csv(r.comparisons.iter(), w));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("new_id,existing_id,new_zone"));
        assert_eq!(
            lines[1],
            "GB1,UKSM,subtidal,5,2,present,,subtidal,5,1.5,missing,,winner_is_new,secondary_confidence,GB1"
        );
        assert!(lines[3].ends_with("Requires expert judgement"));
        assert!(!out.contains('\r'));
    }

    #[test]
    fn erase_excludes_pending() {
        let r = result();
        let projection = Projection::from_comparisons(&r.comparisons);
        let out = render(|w| write_erase_csv(&projection, w));
        assert_eq!(out, "new_id,existing_id\nGB2,GB9\n");
    }

    #[test]
    fn intersected_rows() {
        let r = result();
        let out = render(|w| write_intersected_csv(&r, w));
        assert_eq!(out, "existing_id,new_ids,count\nGB9,GB2;GB3,2\n");
    }

    #[test]
    fn writes_directory_and_skips_clean_audit() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let written = write_run_outputs(&result(), &out).unwrap();
        let names: Vec<_> = written.iter().filter_map(|p| p.file_name()?.to_str()).collect();
        assert_eq!(
            names,
            vec![COMPARISONS_FILE, REVIEW_QUEUE_FILE, JOIN_RESULTS_FILE, ERASE_FROM_NEW_FILE, ISSUES_FILE, INTERSECTED_FILE]
        );
        let review = std::fs::read_to_string(out.join(REVIEW_QUEUE_FILE)).unwrap();
        assert_eq!(review.lines().count(), 2);
        let join = std::fs::read_to_string(out.join(JOIN_RESULTS_FILE)).unwrap();
        assert!(join.contains("GB3,GB9,Requires expert judgement"));
    }
}
