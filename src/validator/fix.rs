//! Batch application of a fix ledger
//!
//! Only `auto` entries are applied. Manual entries come back untouched for
//! reporting. An auto entry that no longer matches the current map (the map
//! was edited after lint) is reported as failed rather than forced.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::{block_label, AlignmentMap, FixEntry, FixLedger, IssueKind, LineRange};

/// Outcome of applying a ledger
#[derive(Debug, Default)]
pub struct ApplyReport {
    /// What was changed, one line per fix
    pub applied: Vec<String>,
    /// Manual entries, left for the user
    pub skipped: Vec<FixEntry>,
    /// Auto entries that could not be applied, with the reason
    pub failed: Vec<(FixEntry, String)>,
}

impl ApplyReport {
    /// True when nothing is left for the user to resolve
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }

    fn fail(&mut self, entry: &FixEntry, reason: impl Into<String>) {
        self.failed.push((entry.clone(), reason.into()));
    }
}

/// Apply every `auto` entry of `ledger` to `map`
///
/// Removals go first so relocated blocks can move into freed ranges.
/// Relocations of one file are applied together, so two blocks may swap
/// places.
pub fn apply_fixes(map: &mut AlignmentMap, ledger: &FixLedger) -> ApplyReport {
    let mut report = ApplyReport::default();
    let mut relocations: BTreeMap<PathBuf, Vec<&FixEntry>> = BTreeMap::new();
    let mut block_removals = Vec::new();
    let mut mapping_removals = Vec::new();
    let mut alignment_removals = Vec::new();

    for entry in &ledger.fixes {
        if !entry.is_auto() {
            report.skipped.push(entry.clone());
            continue;
        }
        match entry.issue {
            IssueKind::LineDrift => relocations.entry(entry.file.clone()).or_default().push(entry),
            IssueKind::InvalidLines if entry.new_lines.is_some() => {
                relocations.entry(entry.file.clone()).or_default().push(entry)
            }
            IssueKind::InvalidLines => block_removals.push(entry),
            IssueKind::MissingFile => mapping_removals.push(entry),
            IssueKind::MissingAnchor => alignment_removals.push(entry),
            IssueKind::ParseError | IssueKind::ReadError => {
                report.fail(entry, format!("No automatic fix for {}", entry.issue))
            }
        }
    }

    for entry in mapping_removals {
        remove_mapping(map, entry, &mut report);
    }
    for entry in block_removals {
        remove_block(map, entry, &mut report);
    }
    for entry in alignment_removals {
        remove_alignment(map, entry, &mut report);
    }
    for (file, entries) in &relocations {
        relocate_blocks(map, file, entries, &mut report);
    }

    report
}

fn remove_mapping(map: &mut AlignmentMap, entry: &FixEntry, report: &mut ApplyReport) {
    let reappeared = map.resolve(&entry.file).map(|p| p.exists()).unwrap_or(false);
    if reappeared {
        report.fail(entry, "File exists again");
        return;
    }
    match map.remove_mapping(&entry.file) {
        Ok(_) => report
            .applied
            .push(format!("Removed file mapping: {}", entry.file.display())),
        Err(e) => report.fail(entry, e.to_string()),
    }
}

fn remove_block(map: &mut AlignmentMap, entry: &FixEntry, report: &mut ApplyReport) {
    let Some(mapping) = map.get_mapping_mut(&entry.file) else {
        report.fail(entry, format!("No mapping for {}", entry.file.display()));
        return;
    };
    if let Some(reason) = stale_lines(mapping.get_block(&entry.block).map(|b| b.lines), entry) {
        report.fail(entry, reason);
        return;
    }
    match mapping.remove_block(&entry.block) {
        Ok(_) => report.applied.push(format!(
            "Removed block: {}",
            block_label(&entry.file, &entry.block)
        )),
        Err(e) => report.fail(entry, e.to_string()),
    }
}

fn remove_alignment(map: &mut AlignmentMap, entry: &FixEntry, report: &mut ApplyReport) {
    let Some(aligned_ref) = entry.aligned_ref.as_deref() else {
        report.fail(entry, "Entry has no aligned_ref");
        return;
    };
    let block = map
        .get_mapping_mut(&entry.file)
        .and_then(|m| m.get_block_mut(&entry.block));
    let Some(block) = block else {
        report.fail(entry, "Block no longer exists");
        return;
    };

    let before = block.aligned_with.len();
    block.aligned_with.retain(|r| r != aligned_ref);
    if block.aligned_with.len() == before {
        report.fail(entry, format!("'{}' is no longer aligned", aligned_ref));
        return;
    }
    report.applied.push(format!(
        "Removed alignment: {} -> {}",
        block_label(&entry.file, &entry.block),
        aligned_ref
    ));
}

/// Move the drifted blocks of one file
///
/// Tried as one batch first; if the batch leaves blocks overlapping, each
/// move is tried on its own and the colliding ones fail.
fn relocate_blocks(
    map: &mut AlignmentMap,
    file: &Path,
    entries: &[&FixEntry],
    report: &mut ApplyReport,
) {
    let Some(mapping) = map.get_mapping_mut(file) else {
        for entry in entries {
            report.fail(entry, format!("No mapping for {}", file.display()));
        }
        return;
    };

    let mut moves: Vec<(&FixEntry, LineRange)> = Vec::new();
    for &entry in entries {
        let current = mapping.get_block(&entry.block).map(|b| b.lines);
        if let Some(reason) = stale_lines(current, entry) {
            report.fail(entry, reason);
            continue;
        }
        match entry.new_lines {
            Some(new_lines) => moves.push((entry, new_lines)),
            None => report.fail(entry, "Entry has no new_lines"),
        }
    }

    let mut batch = mapping.clone();
    for (entry, new_lines) in &moves {
        if let Some(block) = batch.get_block_mut(&entry.block) {
            block.lines = *new_lines;
        }
    }

    if batch.check_overlaps().is_empty() {
        *mapping = batch;
        for (entry, new_lines) in &moves {
            report.applied.push(describe_move(entry, *new_lines));
        }
        return;
    }

    log::debug!(
        "Batch relocation in {} overlaps, applying moves one by one",
        file.display()
    );
    for (entry, new_lines) in moves {
        match mapping.relocate_block(&entry.block, new_lines) {
            Ok(()) => report.applied.push(describe_move(entry, new_lines)),
            Err(e) => report.fail(entry, e.to_string()),
        }
    }
}

/// Why an entry no longer applies to a block at `current`, if it doesn't
fn stale_lines(current: Option<LineRange>, entry: &FixEntry) -> Option<String> {
    match (current, entry.old_lines) {
        (None, _) => Some(format!("Block '{}' no longer exists", entry.block)),
        (Some(current), Some(old)) if current != old => Some(format!(
            "Block '{}' is now at {}, ledger expected {}",
            entry.block, current, old
        )),
        _ => None,
    }
}

fn describe_move(entry: &FixEntry, new_lines: LineRange) -> String {
    let old = entry
        .old_lines
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "Updated {} lines {} -> {}",
        block_label(&entry.file, &entry.block),
        old,
        new_lines
    )
}
