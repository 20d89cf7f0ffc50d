//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0    | Success                                                     |
//! | 1    | General error (unspecified)                                 |
//! | 2    | Usage error (bad args, unreadable id list)                  |
//! | 3    | Invalid run config                                          |
//! | 4    | Runtime failure (unreadable input, missing column, write)   |
//! | 5    | Run finished but pairs are waiting for expert judgement     |
//!
//! Per-record problems never change the exit code on their own; they are
//! written to `issues.csv`.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Input table unreadable, column missing, or output could not be written.
pub const EXIT_RUNTIME: u8 = 4;

/// At least one pair requires expert judgement. Suppressed by `--allow-review`.
pub const EXIT_REVIEW_PENDING: u8 = 5;
