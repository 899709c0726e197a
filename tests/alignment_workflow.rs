//! End-to-end workflows over real git repositories and map files
//!
//! Covers the commit-time check, lint and apply, and block updates as a
//! user would drive them through the service layer.

mod common;

use std::path::Path;

use alignment_map::models::{CheckResult, FixAction, IssueKind, LineRange};
use alignment_map::services::{
    apply_project_fixes, check_project, lint_project, touch_block, update_block, OverlapStrategy,
    UpdateOutcome, UpdateRequest,
};
use alignment_map::{Block, FileMapping, MapStore};
use common::{app_map, reviewed_doc, TestRepo, APP_PY, DESIGN_MD};

fn r(start: usize, end: usize) -> LineRange {
    LineRange::new(start, end).unwrap()
}

/// Committed project whose block and doc are in sync
fn committed_project(doc_ref: &str, doc_path: &str, doc: &str) -> TestRepo {
    let repo = TestRepo::new();
    repo.write("src/app.py", APP_PY);
    repo.write(doc_path, doc);
    repo.write(".alignment-map.yaml", &app_map(doc_ref, "2024-06-01T10:00:00"));
    repo.commit_all();
    repo
}

// =============================================================================
// Check
// =============================================================================

#[test]
fn test_clean_commit_passes() {
    let repo = committed_project(
        "docs/design.md#overview",
        "docs/design.md",
        &reviewed_doc("2099-01-01", DESIGN_MD),
    );
    repo.write("src/app.py", "class App:\n    def run(self):\n        return 2\n");
    touch_block(&repo.ctx(), Path::new("src/app.py"), "App class", "Return 2").unwrap();
    repo.stage_all();

    let outcome = check_project(&repo.ctx(), false).unwrap();
    assert!(outcome.map_updated);
    assert_eq!(outcome.files_checked, 1);
    assert!(outcome.passed(), "{:?}", outcome.failures);
}

#[test]
fn test_change_without_map_update() {
    let repo = committed_project(
        "docs/design.md#overview",
        "docs/design.md",
        &reviewed_doc("2099-01-01", DESIGN_MD),
    );
    repo.write("src/app.py", "class App:\n    def run(self):\n        return 2\n");
    repo.stage_all();

    let outcome = check_project(&repo.ctx(), false).unwrap();
    assert!(!outcome.map_updated);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].result, CheckResult::MapNotUpdated);
    assert_eq!(outcome.failures[0].block.as_deref(), Some("App class"));
}

#[test]
fn test_doc_without_review_stamp_is_stale_after_touch() {
    let repo = committed_project("docs/design.md#overview", "docs/design.md", DESIGN_MD);
    repo.write("src/app.py", "class App:\n    def run(self):\n        return 2\n");
    touch_block(&repo.ctx(), Path::new("src/app.py"), "App class", "Return 2").unwrap();
    repo.stage_all();

    let outcome = check_project(&repo.ctx(), false).unwrap();
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.result, CheckResult::StaleDoc);
    assert_eq!(failure.aligned_doc.as_deref(), Some("docs/design.md#overview"));
    assert!(failure
        .doc_section
        .as_deref()
        .unwrap()
        .contains("The app runs once."));
}

#[test]
fn test_human_owned_doc_escalates() {
    let repo = committed_project(
        "docs/IDENTITY.md",
        "docs/IDENTITY.md",
        &reviewed_doc("2001-01-01", "# Identity\n"),
    );
    repo.write("src/app.py", "class App:\n    def run(self):\n        return 2\n");
    touch_block(&repo.ctx(), Path::new("src/app.py"), "App class", "Return 2").unwrap();
    repo.stage_all();

    let outcome = check_project(&repo.ctx(), false).unwrap();
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].result, CheckResult::HumanEscalation);
}

#[test]
fn test_unmapped_file_and_lines() {
    let repo = committed_project(
        "docs/design.md#overview",
        "docs/design.md",
        &reviewed_doc("2099-01-01", DESIGN_MD),
    );
    repo.write("src/new.py", "x = 1\n");
    repo.write(
        "src/app.py",
        "class App:\n    def run(self):\n        return 1\n\n\ndef extra():\n    pass\n",
    );
    repo.stage_all();

    let outcome = check_project(&repo.ctx(), false).unwrap();
    let results: Vec<_> = outcome.failures.iter().map(|f| f.result).collect();
    assert!(results.contains(&CheckResult::UnmappedFile));
    assert!(results.contains(&CheckResult::UnmappedLines));
    assert!(!results.contains(&CheckResult::MapNotUpdated));
}

#[test]
fn test_unstaged_mode() {
    let repo = committed_project(
        "docs/design.md#overview",
        "docs/design.md",
        &reviewed_doc("2099-01-01", DESIGN_MD),
    );
    repo.write("src/app.py", "class App:\n    def run(self):\n        return 2\n");

    assert!(check_project(&repo.ctx(), false).unwrap().passed());
    let unstaged = check_project(&repo.ctx(), true).unwrap();
    assert!(!unstaged.staged);
    assert_eq!(unstaged.failures[0].result, CheckResult::MapNotUpdated);
}

// =============================================================================
// Lint and apply
// =============================================================================

#[test]
fn test_lint_reports_drift_and_apply_fixes_it() {
    let repo = committed_project(
        "docs/design.md#overview",
        "docs/design.md",
        &reviewed_doc("2099-01-01", DESIGN_MD),
    );
    repo.write(
        "src/app.py",
        &format!("import os\nimport sys\n\n{}", APP_PY),
    );

    let lint = lint_project(&repo.ctx()).unwrap();
    assert_eq!(lint.ledger.fixes.len(), 1);
    let entry = &lint.ledger.fixes[0];
    assert_eq!(entry.issue, IssueKind::LineDrift);
    assert_eq!(entry.action, FixAction::Auto);
    assert_eq!(entry.old_lines, Some(r(1, 3)));
    assert_eq!(entry.new_lines, Some(r(4, 6)));

    let applied = apply_project_fixes(&repo.ctx()).unwrap();
    assert_eq!(applied.remaining, 0);

    let store = MapStore::load(repo.path(".alignment-map.yaml")).unwrap();
    let block = store
        .map()
        .get_mapping(Path::new("src/app.py"))
        .and_then(|m| m.get_block("App class"))
        .unwrap();
    assert_eq!(block.lines, r(4, 6));
    assert!(lint_project(&repo.ctx()).unwrap().is_clean());
}

#[test]
fn test_lint_missing_anchor_is_manual() {
    let repo = committed_project(
        "docs/design.md#nonexistent-heading",
        "docs/design.md",
        &reviewed_doc("2099-01-01", DESIGN_MD),
    );

    let lint = lint_project(&repo.ctx()).unwrap();
    assert_eq!(lint.ledger.fixes.len(), 1);
    assert_eq!(lint.ledger.fixes[0].issue, IssueKind::MissingAnchor);
    assert!(!lint.ledger.fixes[0].is_auto());

    let applied = apply_project_fixes(&repo.ctx()).unwrap();
    assert_eq!(applied.report.skipped.len(), 1);
    assert_eq!(applied.remaining, 1);
    assert!(repo.ctx().ledger_path().exists());
}

// =============================================================================
// Update
// =============================================================================

fn two_block_project() -> TestRepo {
    let repo = TestRepo::new();
    let source: String = (1..=20).map(|i| format!("line_{} = {}\n", i, i)).collect();
    repo.write("src/data.py", &source);

    let mut mapping = FileMapping::new("src/data.py");
    mapping.add_block(Block::new("Head", r(1, 5))).unwrap();
    mapping.add_block(Block::new("Tail", r(10, 15))).unwrap();
    let mut store = MapStore::load_or_init(repo.path(".alignment-map.yaml")).unwrap();
    store.map_mut().add_mapping(mapping).unwrap();
    store.save().unwrap();
    repo
}

fn request(lines: LineRange) -> UpdateRequest {
    UpdateRequest {
        file: "src/data.py".into(),
        name: "Middle".into(),
        lines,
        aligned_with: vec!["docs/data.md".into()],
        comment: None,
    }
}

#[test]
fn test_update_conflict_leaves_map_untouched() {
    let repo = two_block_project();
    let before = repo.read(".alignment-map.yaml");

    let outcome = update_block(&repo.ctx(), &request(r(3, 12)), None).unwrap();
    let UpdateOutcome::Conflict(conflict) = outcome else {
        panic!("expected a conflict");
    };
    let names: Vec<_> = conflict.overlapping.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Head", "Tail"]);
    assert_eq!(conflict.suggested, OverlapStrategy::Replace);
    assert_eq!(repo.read(".alignment-map.yaml"), before);
}

#[test]
fn test_update_with_replace_consolidates() {
    let repo = two_block_project();
    let outcome =
        update_block(&repo.ctx(), &request(r(3, 12)), Some(OverlapStrategy::Replace)).unwrap();
    assert!(outcome.is_applied());

    let store = MapStore::load(repo.path(".alignment-map.yaml")).unwrap();
    let mapping = store.map().get_mapping(Path::new("src/data.py")).unwrap();
    assert_eq!(mapping.blocks.len(), 1);
    assert_eq!(mapping.blocks[0].name, "Middle");
    assert_eq!(mapping.blocks[0].lines, r(3, 12));
    assert!(mapping.check_overlaps().is_empty());
}

#[test]
fn test_update_rejects_range_past_end_of_file() {
    let repo = two_block_project();
    let err = update_block(&repo.ctx(), &request(r(18, 40)), None).unwrap_err();
    assert!(err.to_string().contains("exceeds file length"));
}

#[test]
fn test_adding_inside_existing_block_is_rejected() {
    let mut mapping = FileMapping::new("src/a.py");
    mapping.add_block(Block::new("Outer", r(1, 10))).unwrap();
    let before = mapping.clone();

    assert!(mapping.add_block(Block::new("Inner", r(5, 8))).is_err());
    assert_eq!(mapping, before);
}
