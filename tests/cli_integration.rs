//! CLI integration tests for alignment-map
//!
//! These drive the binary the way a developer or a pre-commit hook would,
//! checking exit codes and the essentials of the output.

mod common;

use common::{app_map, reviewed_doc, TestRepo, APP_PY, DESIGN_MD};
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command instance for the alignment-map binary
fn alignment_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("alignment-map"));
    cmd.env("NO_COLOR", "1").env_remove("ALIGNMENT_MAP");
    cmd
}

fn synced_project() -> TestRepo {
    let repo = TestRepo::new();
    repo.write("src/app.py", APP_PY);
    repo.write("docs/design.md", &reviewed_doc("2099-01-01", DESIGN_MD));
    repo.write(
        ".alignment-map.yaml",
        &app_map("docs/design.md#overview", "2024-06-01T10:00:00"),
    );
    repo.commit_all();
    repo
}

// =============================================================================
// General
// =============================================================================

#[test]
fn test_help_lists_commands() {
    alignment_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("lint"))
        .stdout(predicate::str::contains("install-hook"));
}

#[test]
fn test_missing_map_is_an_environment_error() {
    let dir = TempDir::new().unwrap();
    alignment_cmd()
        .current_dir(dir.path())
        .args(["--mapfile", "nowhere/.alignment-map.yaml", "lint"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Alignment map not found"));
}

#[test]
fn test_completions() {
    alignment_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alignment-map"));
}

// =============================================================================
// Check
// =============================================================================

#[test]
fn test_check_passes_with_nothing_staged() {
    let repo = synced_project();
    alignment_cmd()
        .current_dir(repo.path("src"))
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alignment check passed"));
}

#[test]
fn test_check_fails_when_map_not_updated() {
    let repo = synced_project();
    repo.write("src/app.py", "class App:\n    def run(self):\n        return 2\n");
    repo.stage_all();

    alignment_cmd()
        .current_dir(repo.path(""))
        .arg("check")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ALIGNMENT CHECK FAILED"))
        .stdout(predicate::str::contains("App class"));
}

#[test]
fn test_check_json_after_touch() {
    let repo = synced_project();
    repo.write("src/app.py", "class App:\n    def run(self):\n        return 2\n");

    alignment_cmd()
        .current_dir(repo.path(""))
        .args(["touch", "src/app.py", "--block", "App class", "--comment", "Return 2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Touched 'App class'"));
    repo.stage_all();

    let output = alignment_cmd()
        .current_dir(repo.path(""))
        .args(["check", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["map_updated"], true);
    assert_eq!(json["failures"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Lint
// =============================================================================

#[test]
fn test_lint_then_apply() {
    let repo = synced_project();
    repo.write("src/app.py", &format!("import os\n\n\n{}", APP_PY));

    alignment_cmd()
        .current_dir(repo.path(""))
        .arg("lint")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("line_drift"));
    assert!(repo.path(".alignment-map.fixes").exists());

    alignment_cmd()
        .current_dir(repo.path(""))
        .args(["lint", "--apply"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated src/app.py:App class lines 1-3 -> 4-6"));
    assert!(!repo.path(".alignment-map.fixes").exists());

    alignment_cmd()
        .current_dir(repo.path(""))
        .arg("lint")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alignment map is valid"));
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_creates_map_then_detects_overlap() {
    let repo = TestRepo::new();
    repo.write("src/app.py", APP_PY);

    alignment_cmd()
        .current_dir(repo.path(""))
        .args([
            "update",
            "src/app.py",
            "--block",
            "App class",
            "--lines",
            "1-3",
            "--aligned-with",
            "docs/design.md#overview",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created new alignment map"));
    assert!(repo.read(".alignment-map.yaml").contains("App class"));

    let overlap = [
        "update",
        "src/app.py",
        "--block",
        "run method",
        "--lines",
        "2-3",
        "--aligned-with",
        "docs/design.md#details",
    ];
    alignment_cmd()
        .current_dir(repo.path(""))
        .args(overlap)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Block overlap detected"))
        .stdout(predicate::str::contains("Suggested strategy: extend"));

    alignment_cmd()
        .current_dir(repo.path(""))
        .args(overlap)
        .arg("--split")
        .assert()
        .success();
    let map = repo.read(".alignment-map.yaml");
    assert!(map.contains("run method"));
    assert!(map.contains("App class (part 1)"));
}

#[test]
fn test_update_strategies_are_exclusive() {
    let repo = TestRepo::new();
    repo.write("src/app.py", APP_PY);
    alignment_cmd()
        .current_dir(repo.path(""))
        .args([
            "update", "src/app.py", "--block", "A", "--lines", "1-2", "--aligned-with", "d.md",
            "--extend", "--replace",
        ])
        .assert()
        .code(2);
}

// =============================================================================
// Trace, review, suggest, install-hook, graph
// =============================================================================

#[test]
fn test_trace_json() {
    let repo = synced_project();
    let output = alignment_cmd()
        .current_dir(repo.path(""))
        .args(["trace", "src/app.py:2", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let reference = &json["blocks"][0]["references"][0];
    assert_eq!(json["blocks"][0]["name"], "App class");
    assert_eq!(reference["status"], "current");
    assert!(reference["section"].as_str().unwrap().contains("The app runs once."));
}

#[test]
fn test_trace_unmapped_line() {
    let repo = synced_project();
    alignment_cmd()
        .current_dir(repo.path(""))
        .args(["trace", "src/app.py:40"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not in any mapped block"));
}

#[test]
fn test_review_summary() {
    let repo = synced_project();
    alignment_cmd()
        .current_dir(repo.path(""))
        .args(["review", "src/app.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Estimated impact: minimal"));
}

#[test]
fn test_suggest_for_unmapped_file() {
    let repo = synced_project();
    repo.write("src/worker.py", "def work():\n    return 1\n");
    alignment_cmd()
        .current_dir(repo.path(""))
        .args(["suggest", "src/worker.py"])
        .assert()
        .success()
        .stdout(predicate::str::contains("work function"))
        .stdout(predicate::str::contains("--lines 1-2"));
}

#[test]
fn test_install_hook() {
    let repo = synced_project();
    alignment_cmd()
        .current_dir(repo.path(""))
        .arg("install-hook")
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed pre-commit hook"));

    let hook = repo.read(".git/hooks/pre-commit");
    assert!(hook.contains("alignment-map check"));

    alignment_cmd()
        .current_dir(repo.path(""))
        .arg("install-hook")
        .assert()
        .success()
        .stdout(predicate::str::contains("already installed"));
}

#[test]
fn test_graph_formats() {
    let repo = synced_project();

    let output = alignment_cmd()
        .current_dir(repo.path(""))
        .args(["graph", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stats"]["total_blocks"], 1);
    assert_eq!(json["edges"][0]["anchor"], "overview");

    alignment_cmd()
        .current_dir(repo.path(""))
        .args(["graph", "--format", "dot"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph AlignmentMap {"))
        .stdout(predicate::str::contains("#overview"));

    alignment_cmd()
        .current_dir(repo.path(""))
        .arg("graph")
        .assert()
        .success()
        .stdout(predicate::str::contains("App class"))
        .stdout(predicate::str::contains("docs/design.md#overview"));
}
