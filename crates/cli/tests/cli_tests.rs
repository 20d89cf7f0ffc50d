// End-to-end tests for the combmap binary: exit codes, --json stdout contract,
// output tables.
//
// Run with: cargo test -p combmap-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn combmap() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_combmap"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("COMBMAP_LOG");
    cmd
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures")
}

/// Copy the shared fixtures into a fresh directory so outputs land there.
fn fixture_workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in std::fs::read_dir(fixtures_dir()).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap_or(-1)
}

// ===========================================================================
// combmap run
// ===========================================================================

#[test]
fn run_with_pending_review_exits_5() {
    let ws = fixture_workspace();
    let config = ws.path().join("update.combmap.toml");

    let output = combmap().arg("run").arg(&config).output().expect("combmap run");

    assert_eq!(code(&output), 5, "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("9 pairs from 11 intersection rows"), "stderr: {err}");
    assert!(err.contains("3 pair(s) require expert judgement"), "stderr: {err}");
    assert!(err.contains("--allow-review"), "stderr: {err}");
    // Tables are written before the exit code is decided.
    assert!(ws.path().join("out/review_queue.csv").exists());
}

#[test]
fn run_allow_review_exits_0_and_writes_tables() {
    let ws = fixture_workspace();
    let config = ws.path().join("update.combmap.toml");

    let output = combmap()
        .arg("run")
        .arg(&config)
        .arg("--allow-review")
        .output()
        .expect("combmap run --allow-review");

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty(), "stdout should be empty without --json");

    let out = ws.path().join("out");
    for name in ["comparisons.csv", "join_results.csv", "erase_from_new.csv", "issues.csv", "intersected_maps.csv"] {
        assert!(out.join(name).exists(), "{name} missing");
    }
    let join = std::fs::read_to_string(out.join("join_results.csv")).unwrap();
    assert!(join.contains("Requires expert judgement"));
    assert!(stderr(&output).contains("metadata audit: 1 missing primary, 1 zero primary"));
}

#[test]
fn run_json_stdout_is_single_value() {
    let ws = fixture_workspace();
    let config = ws.path().join("update.combmap.toml");
    let out_dir = ws.path().join("elsewhere");

    let output = combmap()
        .arg("run")
        .arg(&config)
        .arg("--json")
        .arg("--allow-review")
        .arg("--out-dir")
        .arg(&out_dir)
        .output()
        .expect("combmap run --json");

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\n{stdout}"));

    assert_eq!(val["summary"]["pairs"], 9);
    assert_eq!(val["comparisons"].as_array().unwrap().len(), 9);
    assert_eq!(val["meta"]["input_hashes"].as_object().unwrap().len(), 5);
    assert!(out_dir.join("comparisons.csv").exists());
    assert!(!ws.path().join("out").exists());
}

#[test]
fn run_output_flag_writes_json_file() {
    let ws = fixture_workspace();
    let config = ws.path().join("update.combmap.toml");
    let json_path = ws.path().join("result.json");

    let output = combmap()
        .arg("run")
        .arg(&config)
        .arg("--allow-review")
        .arg("--output")
        .arg(&json_path)
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let text = std::fs::read_to_string(&json_path).unwrap();
    let val: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(val["meta"]["config_name"], "Combined map update");
}

#[test]
fn run_missing_column_exits_4() {
    let ws = fixture_workspace();
    let config = ws.path().join("update.combmap.toml");
    let toml = std::fs::read_to_string(&config).unwrap().replace("\"NewTotal\"", "\"Total\"");
    std::fs::write(&config, toml).unwrap();

    let output = combmap().arg("run").arg(&config).output().unwrap();

    assert_eq!(code(&output), 4);
    let err = stderr(&output);
    assert!(err.contains("missing column 'Total'"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
}

#[test]
fn run_missing_table_exits_4() {
    let ws = fixture_workspace();
    std::fs::remove_file(ws.path().join("confidence.csv")).unwrap();

    let output = combmap().arg("run").arg(ws.path().join("update.combmap.toml")).output().unwrap();

    assert_eq!(code(&output), 4, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("confidence.csv"));
}

// ===========================================================================
// combmap validate
// ===========================================================================

#[test]
fn validate_fixture_config() {
    let output = combmap()
        .arg("validate")
        .arg(fixtures_dir().join("update.combmap.toml"))
        .output()
        .unwrap();

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("valid: 'Combined map update'"), "stderr: {err}");
    assert!(err.contains("tracking: gui_tracking.csv"), "stderr: {err}");
}

#[test]
fn validate_bad_config_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.combmap.toml");
    std::fs::write(&config, "name = \"broken\"\n[tables]\n").unwrap();

    let output = combmap().arg("validate").arg(&config).output().unwrap();
    assert_eq!(code(&output), 3, "stderr: {}", stderr(&output));
    assert!(stderr(&output).starts_with("error: "));
}

#[test]
fn validate_missing_config_exits_4() {
    let output = combmap().args(["validate", "does/not/exist.combmap.toml"]).output().unwrap();
    assert_eq!(code(&output), 4);
    assert!(stderr(&output).contains("cannot read config"));
}

// ===========================================================================
// Standalone tools
// ===========================================================================

#[test]
fn classify_prints_zone() {
    let output = combmap().args(["classify", "A3.1", "A1.2"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "mixed");

    let output = combmap().args(["classify", "nan", "X9"]).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "error");
}

#[test]
fn level3_one_line_per_value() {
    let output = combmap().args(["level3", "A5.23/A5.27", "A6"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["A5.2", "A6"]);
}

#[test]
fn level3_requires_a_value() {
    let output = combmap().arg("level3").output().unwrap();
    assert_eq!(code(&output), 2);
}

#[test]
fn new_maps_lists_ids_missing_from_combined() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("reference.txt");
    let combined = dir.path().join("combined.txt");
    std::fs::write(&reference, "GB0001\nGB0002\n\nGB0003\n").unwrap();
    std::fs::write(&combined, "GB0002\nUKSM\n").unwrap();

    let output = combmap()
        .arg("new-maps")
        .arg("--reference")
        .arg(&reference)
        .arg("--combined")
        .arg(&combined)
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["GB0001", "GB0003"]);
    assert!(stderr(&output).contains("2 of 3 reference ids"));
}

#[test]
fn new_maps_unreadable_list_is_usage_error() {
    let output = combmap()
        .args(["new-maps", "--reference", "nope.txt", "--combined", "nope.txt"])
        .output()
        .unwrap();
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("hint:  expected a text file with one id per line"));
}

#[test]
fn version_includes_commit() {
    let output = combmap().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with(&format!("combmap {} (", env!("CARGO_PKG_VERSION"))), "{stdout}");
}
