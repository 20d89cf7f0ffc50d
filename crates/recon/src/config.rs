use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub tables: TablesConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    pub intersections: IntersectionTable,
    pub new_attributes: AttributeTable,
    pub existing_attributes: AttributeTable,
    pub confidence: ConfidenceTable,
    #[serde(default)]
    pub tracking: Option<TrackingTable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntersectionTable {
    pub file: String,
    pub columns: IntersectionColumns,
    #[serde(default)]
    pub filter: Option<RowFilter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntersectionColumns {
    pub new_id: String,
    pub existing_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeTable {
    pub file: String,
    pub columns: AttributeColumns,
    #[serde(default)]
    pub filter: Option<RowFilter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeColumns {
    pub id: String,
    pub habitat: String,
    #[serde(default)]
    pub provenance: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceTable {
    pub file: String,
    pub columns: ConfidenceColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceColumns {
    pub id: String,
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingTable {
    pub file: String,
    pub columns: TrackingColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingColumns {
    pub id: String,
    pub title: String,
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub mode: FilterMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Include,
    Exclude,
}

impl RowFilter {
    /// Whether a row whose filter column holds `value` is kept.
    pub fn keeps(&self, value: &str) -> bool {
        let listed = self.values.iter().any(|v| v == value);
        match self.mode {
            FilterMode::Include => listed,
            FilterMode::Exclude => !listed,
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier + Audit + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_intertidal")]
    pub intertidal: Vec<String>,
    #[serde(default = "default_subtidal")]
    pub subtidal: Vec<String>,
    /// Cell values treated as "no habitat code".
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,
}

fn default_intertidal() -> Vec<String> {
    ["A1", "A2", "B3"].map(String::from).to_vec()
}

fn default_subtidal() -> Vec<String> {
    ["A3", "A4", "A5", "A6"].map(String::from).to_vec()
}

fn default_placeholders() -> Vec<String> {
    ["", "nan", "NaN", "NULL", "None"].map(String::from).to_vec()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            intertidal: default_intertidal(),
            subtidal: default_subtidal(),
            placeholders: default_placeholders(),
        }
    }
}

impl ClassifierConfig {
    pub fn is_placeholder(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.placeholders.iter().any(|p| p == trimmed)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Existing ids (modelled layers) whose overlaps don't require new-map
    /// confidence metadata.
    #[serde(default = "default_exempt")]
    pub exempt_existing: Vec<String>,
}

fn default_exempt() -> Vec<String> {
    vec!["UKSM".to_string()]
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { exempt_existing: default_exempt() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default)]
    pub json: Option<String>,
}

fn default_output_dir() -> String {
    "combmap-out".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir(), json: None }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.name.trim().is_empty() {
            return Err(ReconError::ConfigValidation("name must not be empty".into()));
        }

        let c = &self.classifier;
        if c.intertidal.is_empty() || c.subtidal.is_empty() {
            return Err(ReconError::ConfigValidation(
                "classifier token lists must not be empty".into(),
            ));
        }
        for token in c.intertidal.iter().chain(&c.subtidal) {
            if token.trim().is_empty() {
                return Err(ReconError::ConfigValidation("classifier tokens must not be blank".into()));
            }
        }
        if let Some(shared) = c.intertidal.iter().find(|t| c.subtidal.contains(t)) {
            return Err(ReconError::ConfigValidation(format!(
                "token '{shared}' is listed as both intertidal and subtidal"
            )));
        }

        let t = &self.tables;
        check_file("intersections", &t.intersections.file)?;
        check_column("intersections", "new_id", &t.intersections.columns.new_id)?;
        check_column("intersections", "existing_id", &t.intersections.columns.existing_id)?;
        check_filter("intersections", t.intersections.filter.as_ref())?;

        for (name, table) in [("new_attributes", &t.new_attributes), ("existing_attributes", &t.existing_attributes)] {
            check_file(name, &table.file)?;
            check_column(name, "id", &table.columns.id)?;
            check_column(name, "habitat", &table.columns.habitat)?;
            if let Some(ref p) = table.columns.provenance {
                check_column(name, "provenance", p)?;
            }
            check_filter(name, table.filter.as_ref())?;
        }

        check_file("confidence", &t.confidence.file)?;
        check_column("confidence", "id", &t.confidence.columns.id)?;
        check_column("confidence", "primary", &t.confidence.columns.primary)?;
        check_column("confidence", "secondary", &t.confidence.columns.secondary)?;

        if let Some(ref tracking) = t.tracking {
            check_file("tracking", &tracking.file)?;
            check_column("tracking", "id", &tracking.columns.id)?;
            check_column("tracking", "title", &tracking.columns.title)?;
        }

        Ok(())
    }
}

fn check_file(table: &str, file: &str) -> Result<(), ReconError> {
    if file.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!("table '{table}': file must not be empty")));
    }
    Ok(())
}

fn check_column(table: &str, field: &str, column: &str) -> Result<(), ReconError> {
    if column.trim().is_empty() {
        return Err(ReconError::EmptyColumn { table: table.into(), field: field.into() });
    }
    Ok(())
}

fn check_filter(table: &str, filter: Option<&RowFilter>) -> Result<(), ReconError> {
    if let Some(f) = filter {
        check_column(table, "filter.column", &f.column)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
