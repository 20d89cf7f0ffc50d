// combmap CLI - combined habitat map conflict adjudication

mod exit_codes;
mod run;
mod tools;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

/// Env var holding a tracing filter directive, e.g. `COMBMAP_LOG=combmap_recon=debug`.
const LOG_ENV: &str = "COMBMAP_LOG";

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("COMBMAP_COMMIT"), ")");

#[derive(Parser)]
#[command(name = "combmap")]
#[command(about = "Decide which habitat map wins where new survey maps overlap the combined map")]
#[command(version = VERSION)]
struct Cli {
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Adjudicate every overlap described by a run config and write the output tables
    #[command(after_help = "\
Examples:
  combmap run update.combmap.toml
  combmap run update.combmap.toml --json
  combmap run update.combmap.toml --output result.json --out-dir out/
  combmap run update.combmap.toml --allow-review")]
    Run {
        /// Path to the .combmap.toml config file
        config: PathBuf,

        /// Output the full JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the full JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Directory for output tables (default: [output] dir, relative to the config)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Exit 0 even when pairs are waiting for expert judgement
        #[arg(long)]
        allow_review: bool,
    },

    /// Validate a run config without running
    #[command(after_help = "\
Examples:
  combmap validate update.combmap.toml")]
    Validate {
        /// Path to the .combmap.toml config file
        config: PathBuf,
    },

    /// Print the habitat zone of a set of habitat codes
    #[command(after_help = "\
Examples:
  combmap classify A3.1 A1.2      # mixed
  combmap classify A4.3           # subtidal")]
    Classify {
        /// Raw habitat codes of one map unit
        codes: Vec<String>,
    },

    /// Reduce HAB_TYPE values to their EUNIS level-3 codes
    #[command(after_help = "\
Examples:
  combmap level3 'A5.23/A5.27'    # A5.2
  combmap level3 'A4.1+A3' 'A6'")]
    Level3 {
        /// One or more HAB_TYPE values; one result line each
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// List ids in the reference list that are missing from the combined map
    #[command(after_help = "\
Examples:
  combmap new-maps --reference gui_tracking.txt --combined combined_guis.txt")]
    NewMaps {
        /// File with one reference id per line
        #[arg(long)]
        reference: PathBuf,

        /// File with one combined-map id per line
        #[arg(long)]
        combined: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    // Log to stderr; stdout carries JSON and command results.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Run { config, json, output, out_dir, allow_review } => {
            run::cmd_run(run::RunArgs { config, json, output, out_dir, allow_review })
        }
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Classify { codes } => tools::cmd_classify(codes),
        Commands::Level3 { values } => tools::cmd_level3(values),
        Commands::NewMaps { reference, combined } => tools::cmd_new_maps(reference, combined),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
