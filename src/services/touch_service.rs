//! Touch service - restamp a block after its code changed
//!
//! The block's lines are re-derived from the current source when its
//! declaration can be located; otherwise the recorded lines are kept.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::context::ProjectContext;
use crate::error::AlignmentError;
use crate::locator::locator_for_path;
use crate::models::{AlignmentMap, LineRange};
use crate::validator::locate_block;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TouchOutcome {
    pub file: PathBuf,
    pub block: String,
    pub old_lines: LineRange,
    pub new_lines: LineRange,
    pub aligned_with: Vec<String>,
    /// The declaration was found in the source
    pub verified: bool,
}

impl TouchOutcome {
    pub fn moved(&self) -> bool {
        self.old_lines != self.new_lines
    }
}

/// Restamp `name` in `map` against `source`
pub fn touch_in_map(
    map: &mut AlignmentMap,
    file: &Path,
    name: &str,
    source: &str,
    comment: &str,
) -> Result<TouchOutcome> {
    let mapping = map
        .get_mapping_mut(file)
        .ok_or_else(|| AlignmentError::MappingNotFound(file.to_path_buf()))?;

    let Some(block) = mapping.get_block(name) else {
        let available: Vec<String> = mapping
            .blocks
            .iter()
            .map(|b| format!("{} (lines {})", b.name, b.lines))
            .collect();
        anyhow::bail!(
            "Block '{}' not found in {}. Available blocks: {}",
            name,
            file.display(),
            available.join(", ")
        );
    };
    let old_lines = block.lines;

    let located = locator_for_path(file).and_then(|l| locate_block(l.as_ref(), source, name));
    if located.is_none() {
        log::warn!(
            "Could not detect code movement for '{}', keeping lines {}",
            name,
            old_lines
        );
    }
    let new_lines = located.unwrap_or(old_lines);

    mapping.update_block_lines(name, new_lines, Some(comment))?;
    let aligned_with = mapping
        .get_block(name)
        .map(|b| b.aligned_with.clone())
        .unwrap_or_default();

    Ok(TouchOutcome {
        file: file.to_path_buf(),
        block: name.to_string(),
        old_lines,
        new_lines,
        aligned_with,
        verified: located.is_some(),
    })
}

/// Restamp a block of a file on disk and save the map
pub fn touch_block(
    ctx: &ProjectContext,
    file: &Path,
    name: &str,
    comment: &str,
) -> Result<TouchOutcome> {
    let mut store = ctx.load_map()?;
    let path = ctx.resolve(file);
    if !path.is_file() {
        anyhow::bail!("File does not exist: {}", file.display());
    }
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let outcome = touch_in_map(store.map_mut(), file, name, &source, comment)?;
    store.save()?;
    Ok(outcome)
}
