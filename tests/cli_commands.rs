//! End-to-end tests for CLI commands.
//!
//! These tests spawn the `memory-bank` binary and check its JSON output and
//! exit codes.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

const CORE_FILES: [&str; 6] = [
    "projectbrief.md",
    "productContext.md",
    "activeContext.md",
    "systemPatterns.md",
    "techContext.md",
    "progress.md",
];

/// Run memory-bank with given arguments and return (stdout, stderr, exit_code).
fn run(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_memory-bank"))
        .args(args)
        .output()
        .expect("failed to execute memory-bank");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn run_json(args: &[&str]) -> Value {
    let (stdout, stderr, exit_code) = run(args);
    assert_eq!(exit_code, 0, "command failed: {}", stderr);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

fn write_bank(root: &Path) {
    let bank = root.join("memory-bank");
    std::fs::create_dir_all(&bank).expect("Failed to create bank");
    for core in CORE_FILES {
        std::fs::write(bank.join(core), format!("# {}\n", core)).expect("Failed to write document");
    }
}

fn path_arg(temp_dir: &TempDir) -> String {
    temp_dir.path().display().to_string()
}

// ============================================================================
// Validate / Sync
// ============================================================================

#[test]
fn validate_reports_missing_core_documents() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let json = run_json(&["validate", &path_arg(&temp_dir)]);

    assert_eq!(json["isValid"], false);
    assert_eq!(json["missingFiles"].as_array().map(|a| a.len()), Some(6));
    assert_eq!(json["copilotIntegration"], false);
}

#[test]
fn sync_without_index_plans_add_references() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_bank(temp_dir.path());

    let json = run_json(&["sync", &path_arg(&temp_dir)]);

    assert_eq!(json["report"]["isInSync"], false);
    assert_eq!(json["conflict"]["kind"], "missing-references");
    assert_eq!(json["conflict"]["severity"], "high");
    let actions = json["actions"].as_array().expect("actions array");
    assert_eq!(actions.len(), 6);
    assert!(actions.iter().all(|a| a["actionType"] == "add-reference"));
}

#[test]
fn analyze_prints_json() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::create_dir_all(temp_dir.path().join("src")).expect("Failed to create src");
    std::fs::write(
        temp_dir.path().join("src/index.ts"),
        "export function main(x: number) {\n  return x > 0 ? x : 0;\n}\n",
    )
    .expect("write");

    let json = run_json(&["analyze", &path_arg(&temp_dir)]);
    assert_eq!(json["structure"]["metrics"]["fileCount"], 1);
    assert_eq!(json["structure"]["metrics"]["languages"]["typescript"], 1);
    assert!(json["recommendations"]["suggestedFiles"].is_array());
}

// ============================================================================
// Resolve
// ============================================================================

#[test]
fn resolve_yes_brings_bank_in_sync() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_bank(temp_dir.path());

    let json = run_json(&["resolve", &path_arg(&temp_dir), "--yes"]);
    assert_eq!(json["resolved"], true);
    assert_eq!(json["actionsPerformed"].as_array().map(|a| a.len()), Some(6));

    let json = run_json(&["sync", &path_arg(&temp_dir)]);
    assert_eq!(json["report"]["isInSync"], true);
    assert!(json["conflict"].is_null());
}

#[test]
fn resolve_with_closed_input_aborts() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    write_bank(temp_dir.path());

    // stdin is inherited from the test harness; pass an empty one instead
    let output = Command::new(env!("CARGO_BIN_EXE_memory-bank"))
        .args(["resolve", &path_arg(&temp_dir)])
        .stdin(std::process::Stdio::null())
        .output()
        .expect("failed to execute memory-bank");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(json["resolved"], false);
    assert!(json["actionsPerformed"].as_array().map_or(false, |a| a.is_empty()));
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn custom_docs_dir_and_index() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let notes = temp_dir.path().join("notes");
    std::fs::create_dir_all(&notes).expect("Failed to create notes");
    std::fs::write(notes.join("projectbrief.md"), "# Brief\n").expect("write");
    std::fs::write(temp_dir.path().join("AGENTS.md"), "See notes/projectbrief.md\n").expect("write");

    let json = run_json(&[
        "--docs-dir",
        "notes",
        "--index",
        "AGENTS.md",
        "validate",
        &path_arg(&temp_dir),
    ]);
    assert_eq!(json["existingFiles"], serde_json::json!(["projectbrief.md"]));
    assert_eq!(json["copilotIntegration"], true);
}

#[test]
fn unknown_command_returns_exit_2() {
    let (_stdout, _stderr, exit_code) = run(&["frobnicate"]);
    assert_eq!(exit_code, 2);
}
