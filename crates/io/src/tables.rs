//! CSV readers for the four input tables (plus the optional tracking sheet).
//!
//! Column names come from the run config; the row filter, if any, is applied
//! before a row is turned into a record. Score cells that cannot be parsed
//! become load issues, never hard errors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use combmap_recon::config::{
    AttributeTable, ClassifierConfig, ConfidenceTable, IntersectionTable, RowFilter, RunConfig, TrackingTable,
};
use combmap_recon::error::{IssueKind, RecordIssue};
use combmap_recon::model::{AttributeRow, ConfidenceRow, IntersectionRecord, RunInput, TrackingRow};
use tracing::{debug, info};

use crate::TableError;

/// Everything loaded for one run, plus a BLAKE3 hash per input table.
#[derive(Debug, Clone, Default)]
pub struct LoadedInput {
    pub input: RunInput,
    pub hashes: BTreeMap<String, String>,
}

/// Load every table named in `config`, resolving paths against `base_dir`.
pub fn load_run_input(config: &RunConfig, base_dir: &Path) -> Result<LoadedInput, TableError> {
    let t = &config.tables;
    let placeholders = &config.classifier;
    let mut loaded = LoadedInput::default();

    let (data, hash) = read_table(&base_dir.join(&t.intersections.file))?;
    loaded.hashes.insert("intersections".into(), hash);
    loaded.input.intersections = read_intersections(&t.intersections, &data)?;

    let (data, hash) = read_table(&base_dir.join(&t.new_attributes.file))?;
    loaded.hashes.insert("new_attributes".into(), hash);
    loaded.input.new_attributes = read_attributes("new_attributes", &t.new_attributes, &data)?;

    let (data, hash) = read_table(&base_dir.join(&t.existing_attributes.file))?;
    loaded.hashes.insert("existing_attributes".into(), hash);
    loaded.input.existing_attributes = read_attributes("existing_attributes", &t.existing_attributes, &data)?;

    let (data, hash) = read_table(&base_dir.join(&t.confidence.file))?;
    loaded.hashes.insert("confidence".into(), hash);
    loaded.input.confidence =
        read_confidence(&t.confidence, &data, placeholders, &mut loaded.input.load_issues)?;

    if let Some(ref tracking) = t.tracking {
        let (data, hash) = read_table(&base_dir.join(&tracking.file))?;
        loaded.hashes.insert("tracking".into(), hash);
        loaded.input.tracking = read_tracking(tracking, &data)?;
    }

    info!(
        intersections = loaded.input.intersections.len(),
        new_attributes = loaded.input.new_attributes.len(),
        existing_attributes = loaded.input.existing_attributes.len(),
        confidence = loaded.input.confidence.len(),
        tracking = loaded.input.tracking.len(),
        "tables loaded"
    );
    Ok(loaded)
}

pub fn read_intersections(table: &IntersectionTable, data: &str) -> Result<Vec<IntersectionRecord>, TableError> {
    let reader = Table::open("intersections", data)?;
    let new_idx = reader.column(&table.columns.new_id)?;
    let existing_idx = reader.column(&table.columns.existing_id)?;
    let filter = reader.filter(table.filter.as_ref())?;

    let mut rows = Vec::new();
    for record in reader.into_records()? {
        if !keeps(&filter, &record) {
            continue;
        }
        rows.push(IntersectionRecord::new(field(&record, new_idx), field(&record, existing_idx)));
    }
    Ok(rows)
}

pub fn read_attributes(name: &str, table: &AttributeTable, data: &str) -> Result<Vec<AttributeRow>, TableError> {
    let reader = Table::open(name, data)?;
    let id_idx = reader.column(&table.columns.id)?;
    let habitat_idx = reader.column(&table.columns.habitat)?;
    let provenance_idx = match table.columns.provenance {
        Some(ref column) => Some(reader.column(column)?),
        None => None,
    };
    let filter = reader.filter(table.filter.as_ref())?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in reader.into_records()? {
        if !keeps(&filter, &record) {
            dropped += 1;
            continue;
        }
        let mut row = AttributeRow::new(field(&record, id_idx), field(&record, habitat_idx));
        if let Some(idx) = provenance_idx {
            row = row.with_provenance(field(&record, idx));
        }
        rows.push(row);
    }
    if dropped > 0 {
        debug!(table = name, dropped, "rows removed by filter");
    }
    Ok(rows)
}

/// Empty and placeholder cells read as `None`. Anything else that is not a
/// number also reads as `None` and is reported as `InvalidScore`.
pub fn read_confidence(
    table: &ConfidenceTable,
    data: &str,
    placeholders: &ClassifierConfig,
    issues: &mut Vec<RecordIssue>,
) -> Result<Vec<ConfidenceRow>, TableError> {
    let reader = Table::open("confidence", data)?;
    let id_idx = reader.column(&table.columns.id)?;
    let primary_idx = reader.column(&table.columns.primary)?;
    let secondary_idx = reader.column(&table.columns.secondary)?;

    let mut rows = Vec::new();
    for record in reader.into_records()? {
        let id = field(&record, id_idx);
        let mut score = |idx: usize, label: &str| -> Option<f64> {
            let raw = field(&record, idx);
            if placeholders.is_placeholder(raw) {
                return None;
            }
            match raw.trim().parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    issues.push(RecordIssue::new(
                        IssueKind::InvalidScore,
                        id.trim(),
                        format!("{label} score '{raw}' is not a number; treated as missing"),
                    ));
                    None
                }
            }
        };
        let primary = score(primary_idx, "primary");
        let secondary = score(secondary_idx, "secondary");
        rows.push(ConfidenceRow::new(id, primary, secondary));
    }
    Ok(rows)
}

pub fn read_tracking(table: &TrackingTable, data: &str) -> Result<Vec<TrackingRow>, TableError> {
    let reader = Table::open("tracking", data)?;
    let id_idx = reader.column(&table.columns.id)?;
    let title_idx = reader.column(&table.columns.title)?;

    let mut rows = Vec::new();
    for record in reader.into_records()? {
        rows.push(TrackingRow { id: field(&record, id_idx).to_string(), title: field(&record, title_idx).to_string() });
    }
    Ok(rows)
}

/// One id per line; blank lines and surrounding whitespace are ignored.
pub fn read_id_list(path: &Path) -> Result<Vec<String>, TableError> {
    let data = read_file_as_utf8(path)?;
    Ok(data.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
}

/// Decoded contents plus the BLAKE3 hex digest of the raw bytes.
fn read_table(path: &Path) -> Result<(String, String), TableError> {
    let bytes = std::fs::read(path).map_err(|source| read_error(path, source))?;
    let hash = blake3::hash(&bytes).to_hex().to_string();
    Ok((decode(bytes), hash))
}

/// Read a file as UTF-8, falling back to Windows-1252 (spreadsheet exports).
pub fn read_file_as_utf8(path: &Path) -> Result<String, TableError> {
    let bytes = std::fs::read(path).map_err(|source| read_error(path, source))?;
    Ok(decode(bytes))
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{feff}').map(String::from).unwrap_or(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

fn read_error(path: &Path, source: std::io::Error) -> TableError {
    TableError::Read { path: PathBuf::from(path), source }
}

// ---------------------------------------------------------------------------
// Header-indexed reader
// ---------------------------------------------------------------------------

struct Table<'a> {
    name: &'a str,
    headers: Vec<String>,
    reader: csv::Reader<&'a [u8]>,
}

struct ActiveFilter<'f> {
    filter: &'f RowFilter,
    idx: usize,
}

impl<'a> Table<'a> {
    fn open(name: &'a str, data: &'a str) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| TableError::csv(name, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        Ok(Self { name, headers, reader })
    }

    fn column(&self, name: &str) -> Result<usize, TableError> {
        let wanted = name.trim();
        self.headers.iter().position(|h| h == wanted).ok_or_else(|| TableError::MissingColumn {
            table: self.name.to_string(),
            column: wanted.to_string(),
        })
    }

    fn filter<'f>(&self, filter: Option<&'f RowFilter>) -> Result<Option<ActiveFilter<'f>>, TableError> {
        match filter {
            Some(f) => Ok(Some(ActiveFilter { filter: f, idx: self.column(&f.column)? })),
            None => Ok(None),
        }
    }

    fn into_records(mut self) -> Result<Vec<csv::StringRecord>, TableError> {
        let name = self.name;
        self.reader.records().map(|r| r.map_err(|e| TableError::csv(name, e))).collect()
    }
}

fn keeps(filter: &Option<ActiveFilter<'_>>, record: &csv::StringRecord) -> bool {
    match filter {
        Some(active) => active.filter.keeps(field(record, active.idx).trim()),
        None => true,
    }
}

fn field(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}
