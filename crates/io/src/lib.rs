//! Tabular boundary of the combined-map engine: CSV readers driven by the
//! run config, CSV writers for every output table, input fingerprints.

use std::path::PathBuf;

use thiserror::Error;

pub mod export;
pub mod tables;

pub use export::write_run_outputs;
pub use tables::{load_run_input, read_id_list, LoadedInput};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("table '{table}': {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },
    #[error("table '{table}': missing column '{column}'")]
    MissingColumn { table: String, column: String },
}

impl TableError {
    pub(crate) fn csv(table: &str, source: csv::Error) -> Self {
        Self::Csv { table: table.to_string(), source }
    }
}
