//! Suggest service - propose blocks for unmapped code
//!
//! Suggestions come from the syntax tree when the file parses, and from
//! line patterns otherwise. Nothing suggested ever overlaps a block that
//! is already mapped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ignore::WalkBuilder;
use serde::Serialize;

use crate::locator::fallback::{has_patterns, pattern_outline};
use crate::locator::{locator_for_path, Declaration, DeclarationKind, SupportedLanguage};
use crate::models::{AlignmentMap, Block, Confidence, LineRange};
use crate::parser::count_lines;
use crate::Result;

/// Coverage below which a mapped file is still worth suggesting for
const PARTIAL_COVERAGE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSuggestion {
    pub name: String,
    pub lines: LineRange,
    pub kind: DeclarationKind,
    pub confidence: Confidence,
}

impl BlockSuggestion {
    fn from_declaration(decl: &Declaration, confidence: Confidence) -> Self {
        Self {
            name: decl.block_name(),
            lines: decl.lines,
            kind: decl.kind,
            confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSuggestions {
    pub file: PathBuf,
    pub suggestions: Vec<BlockSuggestion>,
}

/// Suggestions for one file's source, given the blocks already mapped
pub fn suggest_for_source(path: &Path, source: &str, existing: &[Block]) -> Vec<BlockSuggestion> {
    let free = |lines: &LineRange| !existing.iter().any(|b| b.lines.overlaps(lines));

    if let Some(outline) = locator_for_path(path).and_then(|l| l.outline(source)) {
        let mut suggestions = Vec::new();
        for decl in &outline {
            if free(&decl.lines) {
                suggestions.push(BlockSuggestion::from_declaration(decl, Confidence::High));
            } else {
                // Container partly mapped: offer its members instead
                suggestions.extend(
                    decl.members
                        .iter()
                        .filter(|m| free(&m.lines))
                        .map(|m| BlockSuggestion::from_declaration(m, Confidence::High)),
                );
            }
        }
        return suggestions;
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if let Some(outline) = pattern_outline(ext, source) {
        log::debug!("Using line patterns for {}", path.display());
        return outline
            .iter()
            .filter(|d| free(&d.lines))
            .map(|d| BlockSuggestion::from_declaration(d, Confidence::Low))
            .collect();
    }

    let line_count = count_lines(source);
    if existing.is_empty() && line_count > 0 {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        return vec![BlockSuggestion {
            name: format!("{} file", stem),
            lines: LineRange::spanning(1, line_count),
            kind: DeclarationKind::File,
            confidence: Confidence::Low,
        }];
    }

    Vec::new()
}

/// Whether suggest knows how to outline files with this extension
pub fn is_source_extension(ext: &str) -> bool {
    SupportedLanguage::from_extension(ext).is_some() || has_patterns(ext)
}

/// Source files under `root` that are unmapped or under-covered
///
/// Hidden paths, ignored paths and files with `test` in their name are
/// skipped.
pub fn find_candidate_files(root: &Path, map: &AlignmentMap) -> Result<Vec<PathBuf>> {
    let threshold = if map.settings.require_complete_coverage {
        1.0
    } else {
        PARTIAL_COVERAGE
    };

    let walker = WalkBuilder::new(root).standard_filters(true).build();
    let mut candidates = Vec::new();

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !is_source_extension(ext) {
            continue;
        }
        let is_test = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase().contains("test"))
            .unwrap_or(false);
        if is_test {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        match map.get_mapping(&relative) {
            None => candidates.push(relative),
            Some(mapping) => {
                let Ok(content) = fs::read_to_string(path) else {
                    log::warn!("Skipping unreadable file {}", path.display());
                    continue;
                };
                if mapping.coverage(count_lines(&content)) < threshold {
                    candidates.push(relative);
                }
            }
        }
    }

    candidates.sort();
    Ok(candidates)
}

/// Suggestions for `file`, or for every candidate file in the project
pub fn suggest(map: &AlignmentMap, file: Option<&Path>) -> Result<Vec<FileSuggestions>> {
    let root = map.project_root()?;
    let files = match file {
        Some(file) => vec![file.to_path_buf()],
        None => find_candidate_files(root, map)?,
    };

    let mut results = Vec::new();
    for file in files {
        let path = root.join(&file);
        if !path.is_file() {
            anyhow::bail!("File does not exist: {}", file.display());
        }
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", file.display()))?;

        let existing = map
            .get_mapping(&file)
            .map(|m| m.blocks.as_slice())
            .unwrap_or_default();
        let suggestions = suggest_for_source(&file, &source, existing);
        if !suggestions.is_empty() {
            results.push(FileSuggestions { file, suggestions });
        }
    }

    Ok(results)
}
