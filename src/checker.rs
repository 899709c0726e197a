//! Staleness checker
//!
//! Maps changed lines to blocks and decides, per block, whether the map
//! and the aligned documents kept up with the change. Outcomes are
//! collected as `CheckFailure` values; nothing here aborts on a single
//! block's problem.

use std::collections::HashSet;
use std::path::Path;

use crate::models::{
    AlignmentMap, Block, CheckFailure, CheckResult, FileChange, LineRange, Suggestion,
};
use crate::parser::DocumentSource;

pub struct Checker<'a, D: DocumentSource> {
    map: &'a AlignmentMap,
    docs: &'a D,
}

impl<'a, D: DocumentSource> Checker<'a, D> {
    pub fn new(map: &'a AlignmentMap, docs: &'a D) -> Self {
        Self { map, docs }
    }

    /// Check every file of a change set, skipping the map file itself
    pub fn check_changes(&self, changes: &[FileChange], map_updated: bool) -> Vec<CheckFailure> {
        let failures = changes
            .iter()
            .filter(|c| !c.is_map_file)
            .flat_map(|c| self.check_file_change(c, map_updated))
            .collect();
        deduplicate_failures(failures)
    }

    /// Check one changed file
    pub fn check_file_change(&self, change: &FileChange, map_updated: bool) -> Vec<CheckFailure> {
        let Some(mapping) = self.map.get_mapping(&change.path) else {
            let mut failure = CheckFailure::new(
                CheckResult::UnmappedFile,
                &change.path,
                format!("File not in alignment map: {}", change.path.display()),
            );
            failure.suggestion = Some(Suggestion::MapFile);
            return vec![failure];
        };

        let mut failures = Vec::new();

        for line in change.added_lines() {
            let Some(block) = mapping.find_block_for_line(line) else {
                failures.push(self.unmapped_line(&change.path, line, mapping.find_nearest_block(line)));
                continue;
            };

            if !map_updated {
                // The block's timestamp has not moved, so doc freshness means nothing yet
                let mut failure = CheckFailure::new(
                    CheckResult::MapNotUpdated,
                    &change.path,
                    format!("Block '{}' modified but alignment map not updated", block.name),
                );
                failure.block = Some(block.name.clone());
                failure.block_lines = Some(block.lines);
                failure.line = Some(line);
                failure.suggestion = Some(Suggestion::UpdateBlockEntry {
                    block: block.name.clone(),
                    lines: block.lines,
                });
                failures.push(failure);
                continue;
            }

            for aligned_ref in &block.aligned_with {
                if let Some(failure) = self.check_aligned_document(&change.path, block, aligned_ref) {
                    failures.push(failure);
                }
            }
        }

        deduplicate_failures(failures)
    }

    fn unmapped_line(&self, file: &Path, line: usize, nearest: Option<&Block>) -> CheckFailure {
        let mut failure = CheckFailure::new(
            CheckResult::UnmappedLines,
            file,
            format!("Line {} not in any mapped block", line),
        );
        failure.line = Some(line);

        let Some(block) = nearest else {
            failure.suggestion = Some(Suggestion::NewBlock { line });
            return failure;
        };

        let extended = if line < block.lines.start() {
            LineRange::spanning(line, block.lines.end())
        } else {
            let reach = line + self.map.settings.line_tolerance;
            block.lines.with_end(block.lines.end().max(reach))
        };
        failure.block = Some(block.name.clone());
        failure.block_lines = Some(block.lines);
        failure.suggestion = Some(Suggestion::ExtendBlock {
            block: block.name.clone(),
            lines: extended,
        });
        failure
    }

    /// Evaluate one `aligned_with` reference of a changed block
    fn check_aligned_document(
        &self,
        file: &Path,
        block: &Block,
        aligned_ref: &str,
    ) -> Option<CheckFailure> {
        let reference = self.map.parse_reference(aligned_ref);
        if reference.is_code {
            return None;
        }

        let doc_path = reference.path.as_str();
        let section = || {
            reference
                .anchor
                .as_deref()
                .and_then(|anchor| self.docs.extract_section(doc_path, anchor))
                .map(|s| s.content)
        };

        let build = |result: CheckResult, message: String, suggestion: Suggestion| {
            let mut failure = CheckFailure::new(result, file, message);
            failure.block = Some(block.name.clone());
            failure.block_lines = Some(block.lines);
            failure.aligned_doc = Some(aligned_ref.to_string());
            failure.doc_section = section();
            failure.suggestion = Some(suggestion);
            failure
        };

        let Some(reviewed) = self.docs.last_reviewed(doc_path) else {
            return Some(build(
                CheckResult::StaleDoc,
                format!("Document has no last_reviewed: {}", aligned_ref),
                Suggestion::AddLastReviewed {
                    doc: doc_path.to_string(),
                },
            ));
        };

        let updated = block.last_updated?;
        if reviewed >= updated {
            return None;
        }

        if self.map.hierarchy.is_human_required(doc_path) {
            Some(build(
                CheckResult::HumanEscalation,
                format!("Human review required for: {}", aligned_ref),
                Suggestion::HumanReview {
                    doc: doc_path.to_string(),
                },
            ))
        } else {
            Some(build(
                CheckResult::StaleDoc,
                format!("Stale document: {}", aligned_ref),
                Suggestion::ReviewDocument {
                    doc: doc_path.to_string(),
                },
            ))
        }
    }
}

/// Keep the first failure per `(file, result, block)`
pub fn deduplicate_failures(failures: Vec<CheckFailure>) -> Vec<CheckFailure> {
    let mut seen = HashSet::new();
    failures
        .into_iter()
        .filter(|f| seen.insert(f.dedup_key()))
        .collect()
}
