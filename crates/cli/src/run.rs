//! `combmap run` and `combmap validate`: config-driven adjudication.

use std::path::{Path, PathBuf};

use combmap_io::TableError;
use combmap_recon::RunConfig;
use tracing::info;

use crate::exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_REVIEW_PENDING, EXIT_RUNTIME};
use crate::CliError;

pub struct RunArgs {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub allow_review: bool,
}

fn run_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn table_err(e: TableError) -> CliError {
    let hint = match &e {
        TableError::MissingColumn { .. } => Some("check the [tables.*.columns] mapping against the CSV header row"),
        TableError::Read { .. } => Some("table paths are resolved relative to the config file"),
        _ => None,
    };
    CliError { code: EXIT_RUNTIME, message: e.to_string(), hint: hint.map(String::from) }
}

fn load_config(config_path: &Path) -> Result<RunConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| run_err(EXIT_RUNTIME, format!("cannot read config {}: {e}", config_path.display())))?;
    RunConfig::from_toml(&config_str).map_err(|e| run_err(EXIT_INVALID_CONFIG, e.to_string()))
}

fn config_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(&args.config)?;
    let base_dir = config_dir(&args.config);

    let loaded = combmap_io::load_run_input(&config, base_dir).map_err(table_err)?;

    let mut result = combmap_recon::run(&config, loaded.input);
    result.meta.input_hashes = loaded.hashes;

    let out_dir = args.out_dir.unwrap_or_else(|| base_dir.join(&config.output.dir));
    let written = combmap_io::write_run_outputs(&result, &out_dir).map_err(table_err)?;
    info!(dir = %out_dir.display(), tables = written.len(), "outputs written");

    let json_path = args.output.or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    if args.json || json_path.is_some() {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| run_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = json_path {
            std::fs::write(path, &json_str)
                .map_err(|e| run_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if args.json {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "combmap '{}': {} pairs from {} intersection rows: {} new wins, {} existing wins, {} need expert judgement",
        result.meta.config_name,
        s.pairs,
        s.intersection_rows,
        s.winner_is_new,
        s.winner_is_existing,
        s.requires_expert_judgement,
    );
    if !result.issues.is_empty() {
        let counts: Vec<String> = s.issue_counts.iter().map(|(k, v)| format!("{k}={v}")).collect();
        eprintln!("issues: {}", counts.join(", "));
    }
    if !result.audit.is_clean() {
        eprintln!(
            "metadata audit: {} missing primary, {} zero primary, {} existing absent from confidence table",
            result.audit.missing_primary.len(),
            result.audit.zero_primary.len(),
            result.audit.absent_existing.len(),
        );
    }
    eprintln!("tables written to {}", out_dir.display());

    if s.requires_expert_judgement > 0 && !args.allow_review {
        return Err(CliError {
            code: EXIT_REVIEW_PENDING,
            message: format!("{} pair(s) require expert judgement", s.requires_expert_judgement),
            hint: Some(format!(
                "see {}; pass --allow-review to exit 0",
                out_dir.join(combmap_io::export::REVIEW_QUEUE_FILE).display()
            )),
        });
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let t = &config.tables;
    eprintln!(
        "valid: '{}' (intersections: {}, new: {}, existing: {}, confidence: {}{})",
        config.name,
        t.intersections.file,
        t.new_attributes.file,
        t.existing_attributes.file,
        t.confidence.file,
        t.tracking.as_ref().map(|tr| format!(", tracking: {}", tr.file)).unwrap_or_default(),
    );
    Ok(())
}
