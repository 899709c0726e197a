//! Map linter
//!
//! Walks every mapping and block of a loaded map and reports what no longer
//! matches the project on disk: vanished files, ranges past end of file,
//! drifted declarations and aligned documents that do not resolve. Each
//! finding is classified as an automatic or a manual fix.

use std::path::Path;

use anyhow::{Context, Result};

use super::drift::{detect_line_drift, locate_block};
use crate::locator::{locator_for_path, DeclarationLocator};
use crate::models::{
    AlignmentMap, Block, Confidence, FileMapping, FixAction, FixEntry, IssueKind,
};
use crate::parser::{count_lines, DocumentSource, FsDocuments};
use crate::store::parse_map;

/// Lint the map file at `map_path`
///
/// A map that does not parse yields exactly one `parse_error` entry.
pub fn lint_map_file(map_path: &Path) -> Result<Vec<FixEntry>> {
    let content = std::fs::read_to_string(map_path)
        .with_context(|| format!("Failed to read alignment map {}", map_path.display()))?;

    let map = match parse_map(&content, map_path) {
        Ok(map) => map,
        Err(e) => {
            log::debug!("Map parse failed: {:#}", e);
            let mut entry = FixEntry::new(
                map_path,
                "",
                IssueKind::ParseError,
                FixAction::Manual,
                format!("Failed to parse alignment map: {:#}", e),
            );
            entry.reason = Some("The map must be repaired by hand before it can be linted".into());
            return Ok(vec![entry]);
        }
    };

    let docs = FsDocuments::new(map.project_root()?, map.settings.fuzzy_match);
    Linter::new(&map, &docs).lint()
}

pub struct Linter<'a, D: DocumentSource> {
    map: &'a AlignmentMap,
    docs: &'a D,
}

impl<'a, D: DocumentSource> Linter<'a, D> {
    pub fn new(map: &'a AlignmentMap, docs: &'a D) -> Self {
        Self { map, docs }
    }

    /// All issues across the map, in mapping then block order
    pub fn lint(&self) -> Result<Vec<FixEntry>> {
        let root = self.map.project_root()?;
        let mut fixes = Vec::new();

        for mapping in &self.map.mappings {
            let path = root.join(&mapping.file);
            if !path.exists() {
                fixes.push(self.missing_file(mapping));
                continue;
            }

            let source = match std::fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    log::warn!("Cannot read {}: {}", path.display(), e);
                    let mut entry = FixEntry::new(
                        &mapping.file,
                        "",
                        IssueKind::ReadError,
                        FixAction::Manual,
                        format!("Failed to read {}: {}", mapping.file.display(), e),
                    );
                    entry.reason = Some("File exists but could not be read".into());
                    fixes.push(entry);
                    continue;
                }
            };

            self.lint_mapping(mapping, &source, &mut fixes);
        }

        Ok(fixes)
    }

    /// Block-level checks for one readable file
    pub fn lint_mapping(&self, mapping: &FileMapping, source: &str, fixes: &mut Vec<FixEntry>) {
        let line_count = count_lines(source);
        let locator = locator_for_path(&mapping.file);
        let locator = locator.as_deref();

        for block in &mapping.blocks {
            if block.lines.end() > line_count {
                fixes.push(self.invalid_lines(mapping, block, source, line_count, locator));
            } else if let Some(locator) = locator {
                if let Some(entry) = self.line_drift(mapping, block, source, locator) {
                    fixes.push(entry);
                }
            }

            self.check_anchors(mapping, block, fixes);
        }
    }

    fn missing_file(&self, mapping: &FileMapping) -> FixEntry {
        let orphaned = self.map.references_to_file(&mapping.file);
        let action = if orphaned.is_empty() {
            FixAction::Auto
        } else {
            FixAction::Manual
        };

        let mut entry = FixEntry::new(
            &mapping.file,
            "",
            IssueKind::MissingFile,
            action,
            format!("File not found: {}", mapping.file.display()),
        );
        if !orphaned.is_empty() {
            entry.reason = Some(format!(
                "Referenced by {} block(s) in other files",
                orphaned.len()
            ));
            entry.orphaned_refs = orphaned;
        }
        entry
    }

    fn invalid_lines(
        &self,
        mapping: &FileMapping,
        block: &Block,
        source: &str,
        line_count: usize,
        locator: Option<&dyn DeclarationLocator>,
    ) -> FixEntry {
        let referenced_by = self.map.references_to_block(&mapping.file, block);
        let action = if block.aligned_with.is_empty() && referenced_by.is_empty() {
            FixAction::Auto
        } else {
            FixAction::Manual
        };

        let mut entry = FixEntry::new(
            &mapping.file,
            &block.name,
            IssueKind::InvalidLines,
            action,
            format!(
                "Block '{}' ends at line {} but file has {} lines",
                block.name,
                block.lines.end(),
                line_count
            ),
        );
        entry.old_lines = Some(block.lines);

        // A located declaration is relocated instead of dropped
        entry.new_lines = locator
            .and_then(|l| locate_block(l, source, &block.name))
            .filter(|lines| mapping.overlapping_blocks(lines, Some(&block.name)).is_empty());

        if action == FixAction::Manual {
            entry.reason =
                Some("Block has aligned documents or is referenced by other blocks".into());
            entry.aligns_with = block.aligned_with.clone();
            entry.referenced_by = referenced_by;
        }
        entry
    }

    fn line_drift(
        &self,
        mapping: &FileMapping,
        block: &Block,
        source: &str,
        locator: &dyn DeclarationLocator,
    ) -> Option<FixEntry> {
        let actual = detect_line_drift(locator, source, &block.name, block.lines)?;
        let collision = mapping
            .overlapping_blocks(&actual, Some(&block.name))
            .first()
            .map(|b| (b.name.clone(), b.lines));

        let action = if collision.is_some() {
            FixAction::Manual
        } else {
            FixAction::Auto
        };

        let mut entry = FixEntry::new(
            &mapping.file,
            &block.name,
            IssueKind::LineDrift,
            action,
            format!(
                "Block '{}' has drifted from {} to {}",
                block.name, block.lines, actual
            ),
        );
        entry.old_lines = Some(block.lines);
        entry.new_lines = Some(actual);

        if let Some((other, other_lines)) = collision {
            entry.reason = Some(format!(
                "New range {} would overlap with '{}' ({})",
                actual, other, other_lines
            ));
            entry.overlap_with = Some(other);
        }
        Some(entry)
    }

    fn check_anchors(&self, mapping: &FileMapping, block: &Block, fixes: &mut Vec<FixEntry>) {
        for raw in &block.aligned_with {
            let reference = self.map.parse_reference(raw);
            if reference.is_code {
                continue;
            }

            let mut entry = if !self.docs.exists(&reference.path) {
                let mut entry = FixEntry::new(
                    &mapping.file,
                    &block.name,
                    IssueKind::MissingAnchor,
                    FixAction::Manual,
                    format!("Aligned document not found: {}", reference.path),
                );
                entry.reason = Some("Document does not exist".into());
                entry
            } else {
                let Some(anchor) = reference.anchor.as_deref() else {
                    continue;
                };
                if self.docs.extract_section(&reference.path, anchor).is_some() {
                    continue;
                }
                let mut entry = FixEntry::new(
                    &mapping.file,
                    &block.name,
                    IssueKind::MissingAnchor,
                    FixAction::Manual,
                    format!("Anchor '#{}' not found in {}", anchor, reference.path),
                );
                entry.confidence = Confidence::Medium;
                entry.reason = Some("No heading matches the anchor".into());
                entry
            };
            entry.aligned_ref = Some(raw.clone());
            fixes.push(entry);
        }
    }
}
