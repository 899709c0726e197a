//! Trace service - everything needed to review a file or line
//!
//! For each traced block, every `aligned_with` reference is resolved to the
//! document section it names, its review stamp and its freshness against
//! the block.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::AlignmentError;
use crate::models::{AlignmentMap, Block, LineRange};
use crate::parser::DocumentSource;
use crate::Result;

/// Freshness of one aligned reference relative to its block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStatus {
    Current,
    Stale,
    NeverReviewed,
    Missing,
    CodeReference,
}

impl ReferenceStatus {
    /// The document must be looked at before the block's change lands
    pub fn needs_review(&self) -> bool {
        matches!(self, Self::Stale | Self::NeverReviewed | Self::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracedReference {
    pub reference: String,
    pub path: String,
    pub anchor: Option<String>,
    pub exists: bool,
    pub requires_human: bool,
    pub last_reviewed: Option<NaiveDateTime>,
    pub section: Option<String>,
    pub status: ReferenceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracedBlock {
    pub name: String,
    pub lines: LineRange,
    pub last_updated: Option<NaiveDateTime>,
    pub last_update_comment: Option<String>,
    pub references: Vec<TracedReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceReport {
    pub file: PathBuf,
    pub line: Option<usize>,
    pub blocks: Vec<TracedBlock>,
}

impl TraceReport {
    /// References whose documents are behind their block
    pub fn stale(&self) -> impl Iterator<Item = (&TracedBlock, &TracedReference)> {
        self.blocks.iter().flat_map(|b| {
            b.references
                .iter()
                .filter(|r| r.status == ReferenceStatus::Stale)
                .map(move |r| (b, r))
        })
    }
}

/// Resolve one `aligned_with` entry of `block`
pub fn resolve_reference<D: DocumentSource>(
    map: &AlignmentMap,
    docs: &D,
    block: &Block,
    raw: &str,
) -> TracedReference {
    let reference = map.parse_reference(raw);
    let mut traced = TracedReference {
        reference: raw.to_string(),
        path: reference.path.clone(),
        anchor: reference.anchor.clone(),
        exists: false,
        requires_human: false,
        last_reviewed: None,
        section: None,
        status: ReferenceStatus::CodeReference,
    };
    if reference.is_code {
        return traced;
    }

    traced.requires_human = map.hierarchy.is_human_required(&reference.path);
    traced.exists = docs.exists(&reference.path);
    if !traced.exists {
        traced.status = ReferenceStatus::Missing;
        return traced;
    }

    traced.last_reviewed = docs.last_reviewed(&reference.path);
    traced.section = reference
        .anchor
        .as_deref()
        .and_then(|anchor| docs.extract_section(&reference.path, anchor))
        .map(|s| s.content);

    traced.status = match (traced.last_reviewed, block.last_updated) {
        (None, _) => ReferenceStatus::NeverReviewed,
        (Some(reviewed), Some(updated)) if reviewed < updated => ReferenceStatus::Stale,
        _ => ReferenceStatus::Current,
    };
    traced
}

pub fn trace_block<D: DocumentSource>(map: &AlignmentMap, docs: &D, block: &Block) -> TracedBlock {
    TracedBlock {
        name: block.name.clone(),
        lines: block.lines,
        last_updated: block.last_updated,
        last_update_comment: block.last_update_comment.clone(),
        references: block
            .aligned_with
            .iter()
            .map(|raw| resolve_reference(map, docs, block, raw))
            .collect(),
    }
}

/// Trace a whole file, or the single block holding `line`
pub fn trace<D: DocumentSource>(
    map: &AlignmentMap,
    docs: &D,
    file: &Path,
    line: Option<usize>,
) -> Result<TraceReport> {
    let mapping = map
        .get_mapping(file)
        .ok_or_else(|| AlignmentError::MappingNotFound(file.to_path_buf()))?;

    let blocks: Vec<&Block> = match line {
        Some(line) => match mapping.find_block_for_line(line) {
            Some(block) => vec![block],
            None => anyhow::bail!("Line {} not in any mapped block of {}", line, file.display()),
        },
        None => mapping.blocks.iter().collect(),
    };

    Ok(TraceReport {
        file: file.to_path_buf(),
        line,
        blocks: blocks.into_iter().map(|b| trace_block(map, docs, b)).collect(),
    })
}

/// Split `FILE[:LINE]`
pub fn parse_location(location: &str) -> (PathBuf, Option<usize>) {
    match location.rsplit_once(':') {
        Some((file, line)) => match line.parse() {
            Ok(line) => (PathBuf::from(file), Some(line)),
            Err(_) => (PathBuf::from(location), None),
        },
        None => (PathBuf::from(location), None),
    }
}
