//! Update service - add or move a block, resolving overlaps
//!
//! `apply_update` is the in-memory core. It works on a copy of the file
//! mapping and only commits it back when the whole update succeeded, so a
//! conflict or an error leaves the map exactly as it was.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use serde::Serialize;

use crate::context::ProjectContext;
use crate::error::AlignmentError;
use crate::models::{normalize_path, AlignmentMap, Block, FileMapping, LineRange};
use crate::parser::count_lines;
use crate::store::MapStore;
use crate::Result;

// =============================================================================
// Strategy
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapStrategy {
    /// Grow the existing block to cover the request
    Extend,
    /// Keep the parts of existing blocks outside the request
    Split,
    /// Drop the overlapped blocks in favour of the request
    Replace,
}

impl fmt::Display for OverlapStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extend => f.write_str("extend"),
            Self::Split => f.write_str("split"),
            Self::Replace => f.write_str("replace"),
        }
    }
}

impl FromStr for OverlapStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "extend" => Ok(Self::Extend),
            "split" => Ok(Self::Split),
            "replace" => Ok(Self::Replace),
            other => anyhow::bail!("Invalid strategy: {}", other),
        }
    }
}

/// The strategy to recommend for `requested` against the blocks it hits
pub fn suggest_strategy(requested: &LineRange, overlapping: &[Block]) -> OverlapStrategy {
    match overlapping {
        [block] if requested.is_subset_of(&block.lines) => OverlapStrategy::Extend,
        [block] if block.lines.is_subset_of(requested) => OverlapStrategy::Replace,
        [_] => OverlapStrategy::Split,
        _ => OverlapStrategy::Replace,
    }
}

// =============================================================================
// Request and outcome
// =============================================================================

#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub file: PathBuf,
    pub name: String,
    pub lines: LineRange,
    pub aligned_with: Vec<String>,
    pub comment: Option<String>,
}

/// What an applied update did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateChange {
    /// The file had no mapping yet
    CreatedMapping,
    Added,
    /// A block of the same name moved to the requested lines
    Updated { previous: LineRange },
    Extended { from: LineRange },
    Split { parts: Vec<String> },
    Replaced { replaced: Vec<String> },
}

/// The block as it stands after an applied update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedUpdate {
    pub change: UpdateChange,
    pub block: String,
    pub lines: LineRange,
    pub aligned_with: Vec<String>,
}

/// Overlaps found while no strategy was given; nothing was changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapConflict {
    pub requested: LineRange,
    pub overlapping: Vec<Block>,
    pub suggested: OverlapStrategy,
}

impl OverlapConflict {
    /// Why `suggested` fits this overlap
    pub fn explanation(&self) -> String {
        let Some(first) = self.overlapping.first() else {
            return String::new();
        };
        match self.suggested {
            OverlapStrategy::Extend => format!(
                "Lines {} fall within the existing block {}.\nThis likely means you're adding detail to an existing section.",
                self.requested, first.lines
            ),
            OverlapStrategy::Split => format!(
                "Lines {} partially overlap with {}.\nSplitting allows you to create a more granular mapping.",
                self.requested, first.lines
            ),
            OverlapStrategy::Replace if self.overlapping.len() > 1 => format!(
                "Lines {} overlap with multiple blocks.\nReplacing will consolidate them into a single mapping.",
                self.requested
            ),
            OverlapStrategy::Replace => format!(
                "Lines {} completely contain {}.\nReplacing will update the block boundaries.",
                self.requested, first.lines
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Applied(AppliedUpdate),
    Conflict(OverlapConflict),
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

// =============================================================================
// Core
// =============================================================================

/// Apply `request` to `map`
///
/// A block already carrying the requested name is taken out before overlaps
/// are computed, so re-recording a block never collides with itself. It is
/// put back untouched under `Extend`, and otherwise hands its id, review
/// stamp and alignment to the re-recorded block. When
/// the request overlaps other blocks and `strategy` is `None`, the map is
/// left untouched and the conflict is returned.
pub fn apply_update(
    map: &mut AlignmentMap,
    request: &UpdateRequest,
    strategy: Option<OverlapStrategy>,
) -> std::result::Result<UpdateOutcome, AlignmentError> {
    let file = normalize_path(&request.file);

    let Some(existing) = map.get_mapping(&file) else {
        let block = new_block(request, "Initial mapping");
        let mut mapping = FileMapping::new(file);
        mapping.add_block(block.clone())?;
        map.add_mapping(mapping)?;
        return Ok(UpdateOutcome::Applied(applied(UpdateChange::CreatedMapping, &block)));
    };

    let mut mapping = existing.clone();
    let previous = mapping.remove_block(&request.name).ok();
    let overlapping: Vec<Block> = mapping
        .overlapping_blocks(&request.lines, None)
        .into_iter()
        .cloned()
        .collect();

    let outcome = if overlapping.is_empty() {
        add_or_move(&mut mapping, request, previous)?
    } else {
        let suggested = suggest_strategy(&request.lines, &overlapping);
        let Some(strategy) = strategy else {
            return Ok(UpdateOutcome::Conflict(OverlapConflict {
                requested: request.lines,
                overlapping,
                suggested,
            }));
        };
        log::debug!(
            "Resolving overlap of '{}' with {} block(s) by {}",
            request.name,
            overlapping.len(),
            strategy
        );
        match strategy {
            OverlapStrategy::Extend => {
                // The request folds into another block; the same-named one stays where it was
                if let Some(previous) = previous {
                    mapping.add_block(previous)?;
                }
                extend(&mut mapping, request, &overlapping)?
            }
            OverlapStrategy::Split => split(&mut mapping, request, &overlapping, previous.as_ref())?,
            OverlapStrategy::Replace => {
                replace(&mut mapping, request, &overlapping, previous.as_ref())?
            }
        }
    };

    if let Some(slot) = map.get_mapping_mut(&file) {
        *slot = mapping;
    }
    Ok(UpdateOutcome::Applied(outcome))
}

fn new_block(request: &UpdateRequest, default_comment: &str) -> Block {
    let mut block = Block::new(&request.name, request.lines).with_aligned(request.aligned_with.clone());
    block.touch(Some(request.comment.as_deref().unwrap_or(default_comment)));
    block
}

/// Carry identity and review state of the block being re-recorded
fn inherit(block: &mut Block, previous: Option<&Block>) {
    let Some(previous) = previous else {
        return;
    };
    block.id = previous.id.clone();
    block.last_reviewed = previous.last_reviewed;
    for reference in &previous.aligned_with {
        if !block.aligned_with.contains(reference) {
            block.aligned_with.push(reference.clone());
        }
    }
}

fn applied(change: UpdateChange, block: &Block) -> AppliedUpdate {
    AppliedUpdate {
        change,
        block: block.name.clone(),
        lines: block.lines,
        aligned_with: block.aligned_with.clone(),
    }
}

fn add_or_move(
    mapping: &mut FileMapping,
    request: &UpdateRequest,
    previous: Option<Block>,
) -> std::result::Result<AppliedUpdate, AlignmentError> {
    let Some(previous) = previous else {
        let block = new_block(request, "Added new block");
        mapping.add_block(block.clone())?;
        return Ok(applied(UpdateChange::Added, &block));
    };

    let comment = format!("Updated block from {} to {}", previous.lines, request.lines);
    let mut block = new_block(request, &comment);
    block.id = previous.id;
    block.last_reviewed = previous.last_reviewed;
    mapping.add_block(block.clone())?;
    Ok(applied(
        UpdateChange::Updated {
            previous: previous.lines,
        },
        &block,
    ))
}

/// Fold the request and every overlapped block into the first overlapped one
fn extend(
    mapping: &mut FileMapping,
    request: &UpdateRequest,
    overlapping: &[Block],
) -> std::result::Result<AppliedUpdate, AlignmentError> {
    let (target, others) = match overlapping.split_first() {
        Some(split) => split,
        None => return add_or_move(mapping, request, None),
    };

    let mut lines = target.lines.union(&request.lines);
    let mut aligned: Vec<String> = target.aligned_with.clone();
    for other in others {
        lines = lines.union(&other.lines);
        aligned.extend(other.aligned_with.iter().cloned());
        mapping.remove_block(&other.name)?;
    }
    aligned.extend(request.aligned_with.iter().cloned());
    aligned.sort();
    aligned.dedup();

    let comment = match &request.comment {
        Some(comment) => comment.clone(),
        None => format!("Extended block from {} to {}", target.lines, lines),
    };
    mapping.update_block_lines(&target.name, lines, Some(&comment))?;
    if let Some(block) = mapping.get_block_mut(&target.name) {
        block.aligned_with = aligned.clone();
    }

    Ok(AppliedUpdate {
        change: UpdateChange::Extended { from: target.lines },
        block: target.name.clone(),
        lines,
        aligned_with: aligned,
    })
}

/// Carve the request out of every overlapped block, keeping the remainders
fn split(
    mapping: &mut FileMapping,
    request: &UpdateRequest,
    overlapping: &[Block],
    previous: Option<&Block>,
) -> std::result::Result<AppliedUpdate, AlignmentError> {
    for block in overlapping {
        mapping.remove_block(&block.name)?;
    }

    let mut parts = Vec::new();
    for block in overlapping {
        let comment = match &request.comment {
            Some(comment) => comment.clone(),
            None => format!("Split from '{}'", block.name),
        };
        let remainders = [
            (block.lines.before(&request.lines), 1),
            (block.lines.after(&request.lines), 2),
        ];
        for (range, part) in remainders {
            let Some(range) = range else {
                continue;
            };
            let name = part_name(mapping, &block.name, part, &request.name);
            let mut remainder = Block::new(name, range).with_aligned(block.aligned_with.clone());
            remainder.touch(Some(&comment));
            parts.push(remainder.name.clone());
            mapping.add_block(remainder)?;
        }
    }

    let comment = format!("Split from '{}'", overlapping[0].name);
    let mut block = new_block(request, &comment);
    inherit(&mut block, previous);
    mapping.add_block(block.clone())?;

    Ok(applied(UpdateChange::Split { parts }, &block))
}

/// Drop every overlapped block and insert the request
fn replace(
    mapping: &mut FileMapping,
    request: &UpdateRequest,
    overlapping: &[Block],
    previous: Option<&Block>,
) -> std::result::Result<AppliedUpdate, AlignmentError> {
    for block in overlapping {
        mapping.remove_block(&block.name)?;
    }

    let names: Vec<String> = overlapping.iter().map(|b| b.name.clone()).collect();
    let comment = format!("Replaced '{}'", names.join("', '"));
    let mut block = new_block(request, &comment);
    inherit(&mut block, previous);
    mapping.add_block(block.clone())?;

    Ok(applied(UpdateChange::Replaced { replaced: names }, &block))
}

/// `"<base> (part N)"`, bumping `N` until the name is free
fn part_name(mapping: &FileMapping, base: &str, first: usize, reserved: &str) -> String {
    (first..)
        .map(|n| format!("{} (part {})", base, n))
        .find(|name| name != reserved && mapping.get_block(name).is_none())
        .unwrap_or_else(|| format!("{} (part {})", base, first))
}

// =============================================================================
// Persisted update
// =============================================================================

/// Validate `request` against the file on disk and apply it to the map
///
/// The map is created if it does not exist yet. Nothing is written when
/// the outcome is a conflict.
pub fn update_block(
    ctx: &ProjectContext,
    request: &UpdateRequest,
    strategy: Option<OverlapStrategy>,
) -> Result<UpdateOutcome> {
    let path = ctx.resolve(&request.file);
    if !path.is_file() {
        anyhow::bail!("File does not exist: {}", request.file.display());
    }
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", request.file.display()))?;
    let line_count = count_lines(&source);
    if request.lines.end() > line_count {
        anyhow::bail!(
            "Line range {} exceeds file length ({} lines)",
            request.lines,
            line_count
        );
    }

    let mut store = MapStore::load_or_init(&ctx.map_path)?;
    let outcome = apply_update(store.map_mut(), request, strategy)?;
    if outcome.is_applied() {
        store.save()?;
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn r(start: usize, end: usize) -> LineRange {
        LineRange::new(start, end).unwrap()
    }

    fn map_of(blocks: Vec<Block>) -> AlignmentMap {
        let mut map = AlignmentMap::new();
        let mut mapping = FileMapping::new("src/a.py");
        for block in blocks {
            mapping.add_block(block).unwrap();
        }
        map.add_mapping(mapping).unwrap();
        map
    }

    fn request(name: &str, lines: LineRange, aligned: &[&str]) -> UpdateRequest {
        UpdateRequest {
            file: PathBuf::from("src/a.py"),
            name: name.to_string(),
            lines,
            aligned_with: aligned.iter().map(|s| s.to_string()).collect(),
            comment: None,
        }
    }

    fn blocks(map: &AlignmentMap) -> Vec<(String, LineRange)> {
        map.get_mapping(Path::new("src/a.py"))
            .unwrap()
            .blocks
            .iter()
            .map(|b| (b.name.clone(), b.lines))
            .collect()
    }

    #[test]
    fn test_suggest_strategy() {
        let b = Block::new("B", r(10, 20));
        assert_eq!(suggest_strategy(&r(12, 15), &[b.clone()]), OverlapStrategy::Extend);
        assert_eq!(suggest_strategy(&r(5, 25), &[b.clone()]), OverlapStrategy::Replace);
        assert_eq!(suggest_strategy(&r(15, 25), &[b.clone()]), OverlapStrategy::Split);
        assert_eq!(
            suggest_strategy(&r(1, 30), &[b, Block::new("C", r(21, 22))]),
            OverlapStrategy::Replace
        );
    }

    #[test]
    fn test_multi_overlap_without_strategy_changes_nothing() {
        let mut map = map_of(vec![Block::new("A", r(1, 5)), Block::new("B", r(10, 15))]);
        let before = map.clone();

        let outcome = apply_update(&mut map, &request("New", r(3, 12), &["docs/x.md"]), None).unwrap();
        let UpdateOutcome::Conflict(conflict) = outcome else {
            panic!("expected conflict");
        };
        let names: Vec<_> = conflict.overlapping.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(conflict.suggested, OverlapStrategy::Replace);
        assert!(conflict.explanation().contains("multiple blocks"));
        assert_eq!(map, before);
    }

    #[test]
    fn test_new_file_creates_mapping() {
        let mut map = AlignmentMap::new();
        let outcome = apply_update(&mut map, &request("A", r(1, 5), &["docs/a.md"]), None).unwrap();
        let UpdateOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(applied.change, UpdateChange::CreatedMapping);
        let block = &map.get_mapping(Path::new("src/a.py")).unwrap().blocks[0];
        assert_eq!(block.last_update_comment.as_deref(), Some("Initial mapping"));
        assert!(block.last_updated.is_some());
    }

    #[test]
    fn test_add_without_overlap() {
        let mut map = map_of(vec![Block::new("A", r(1, 5))]);
        let outcome = apply_update(&mut map, &request("B", r(6, 9), &[]), None).unwrap();
        assert!(matches!(
            outcome,
            UpdateOutcome::Applied(AppliedUpdate { change: UpdateChange::Added, .. })
        ));
        assert_eq!(blocks(&map).len(), 2);
    }

    #[test]
    fn test_same_name_moves_block() {
        let mut original = Block::new("A", r(1, 5));
        original.id = Some("a-id".into());
        let mut map = map_of(vec![original, Block::new("B", r(10, 12))]);

        let outcome = apply_update(&mut map, &request("A", r(1, 8), &["docs/a.md"]), None).unwrap();
        let UpdateOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(applied.change, UpdateChange::Updated { previous: r(1, 5) });
        let mapping = map.get_mapping(Path::new("src/a.py")).unwrap();
        let block = mapping.get_block("A").unwrap();
        assert_eq!(block.lines, r(1, 8));
        assert_eq!(block.id.as_deref(), Some("a-id"));
        assert_eq!(mapping.blocks.len(), 2);
    }

    #[test]
    fn test_extend_merges_alignment() {
        let mut map = map_of(vec![
            Block::new("Outer", r(10, 20)).with_aligned(vec!["docs/b.md".into()])
        ]);
        let outcome = apply_update(
            &mut map,
            &request("Inner", r(12, 15), &["docs/a.md", "docs/b.md"]),
            Some(OverlapStrategy::Extend),
        )
        .unwrap();
        let UpdateOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(applied.block, "Outer");
        assert_eq!(applied.lines, r(10, 20));
        assert_eq!(applied.aligned_with, vec!["docs/a.md".to_string(), "docs/b.md".to_string()]);
        assert_eq!(blocks(&map), vec![("Outer".to_string(), r(10, 20))]);
    }

    #[test]
    fn test_split_keeps_remainders() {
        let mut map = map_of(vec![
            Block::new("Big", r(1, 20)).with_aligned(vec!["docs/big.md".into()])
        ]);
        let outcome = apply_update(
            &mut map,
            &request("Middle", r(8, 12), &["docs/mid.md"]),
            Some(OverlapStrategy::Split),
        )
        .unwrap();
        let UpdateOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(
            applied.change,
            UpdateChange::Split {
                parts: vec!["Big (part 1)".into(), "Big (part 2)".into()]
            }
        );
        assert_eq!(
            blocks(&map),
            vec![
                ("Big (part 1)".to_string(), r(1, 7)),
                ("Big (part 2)".to_string(), r(13, 20)),
                ("Middle".to_string(), r(8, 12)),
            ]
        );
        let mapping = map.get_mapping(Path::new("src/a.py")).unwrap();
        assert_eq!(
            mapping.get_block("Big (part 2)").unwrap().aligned_with,
            vec!["docs/big.md".to_string()]
        );
    }

    #[test]
    fn test_split_partial_overlap() {
        let mut map = map_of(vec![Block::new("B", r(10, 20))]);
        apply_update(&mut map, &request("N", r(15, 25), &[]), Some(OverlapStrategy::Split)).unwrap();
        assert_eq!(
            blocks(&map),
            vec![("B (part 1)".to_string(), r(10, 14)), ("N".to_string(), r(15, 25))]
        );
    }

    #[test]
    fn test_replace_consolidates() {
        let mut map = map_of(vec![
            Block::new("A", r(1, 5)),
            Block::new("B", r(10, 15)),
            Block::new("C", r(30, 31)),
        ]);
        let outcome =
            apply_update(&mut map, &request("New", r(3, 12), &[]), Some(OverlapStrategy::Replace))
                .unwrap();
        let UpdateOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(
            applied.change,
            UpdateChange::Replaced {
                replaced: vec!["A".into(), "B".into()]
            }
        );
        assert_eq!(
            blocks(&map),
            vec![("C".to_string(), r(30, 31)), ("New".to_string(), r(3, 12))]
        );
    }

    fn reviewed_block(name: &str, lines: LineRange) -> Block {
        let mut block = Block::new(name, lines).with_aligned(vec!["docs/a.md".into()]);
        block.id = Some("a-id".into());
        block.last_reviewed = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0));
        block
    }

    fn block_a(map: &AlignmentMap) -> Block {
        map.get_mapping(Path::new("src/a.py"))
            .and_then(|m| m.get_block("A"))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_extend_keeps_same_named_block() {
        let original = reviewed_block("A", r(1, 5));
        let mut map = map_of(vec![original.clone(), Block::new("B", r(10, 20))]);

        let outcome = apply_update(
            &mut map,
            &request("A", r(12, 15), &["docs/a.md"]),
            Some(OverlapStrategy::Extend),
        )
        .unwrap();
        let UpdateOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(applied.block, "B");
        assert_eq!(
            blocks(&map),
            vec![("B".to_string(), r(10, 20)), ("A".to_string(), r(1, 5))]
        );
        assert_eq!(block_a(&map), original);
    }

    #[test]
    fn test_extend_over_same_named_block_is_rejected() {
        let mut map = map_of(vec![reviewed_block("A", r(1, 5)), Block::new("B", r(10, 20))]);
        let before = map.clone();

        let result = apply_update(
            &mut map,
            &request("A", r(3, 15), &[]),
            Some(OverlapStrategy::Extend),
        );
        assert!(matches!(result, Err(AlignmentError::Overlap { .. })));
        assert_eq!(map, before);
    }

    #[test]
    fn test_split_carries_same_named_block() {
        let mut map = map_of(vec![reviewed_block("A", r(1, 5)), Block::new("B", r(10, 20))]);

        apply_update(
            &mut map,
            &request("A", r(15, 25), &["docs/new.md"]),
            Some(OverlapStrategy::Split),
        )
        .unwrap();
        assert_eq!(
            blocks(&map),
            vec![("B (part 1)".to_string(), r(10, 14)), ("A".to_string(), r(15, 25))]
        );
        let block = block_a(&map);
        assert_eq!(block.id.as_deref(), Some("a-id"));
        assert!(block.last_reviewed.is_some());
        assert_eq!(
            block.aligned_with,
            vec!["docs/new.md".to_string(), "docs/a.md".to_string()]
        );
    }

    #[test]
    fn test_replace_carries_same_named_block() {
        let original = reviewed_block("A", r(1, 5));
        let mut map = map_of(vec![original.clone(), Block::new("B", r(10, 20))]);

        let outcome = apply_update(
            &mut map,
            &request("A", r(8, 22), &["docs/a.md"]),
            Some(OverlapStrategy::Replace),
        )
        .unwrap();
        let UpdateOutcome::Applied(applied) = outcome else {
            panic!("expected applied");
        };
        assert_eq!(
            applied.change,
            UpdateChange::Replaced {
                replaced: vec!["B".into()]
            }
        );
        assert_eq!(blocks(&map), vec![("A".to_string(), r(8, 22))]);
        let block = block_a(&map);
        assert_eq!(block.id, original.id);
        assert_eq!(block.last_reviewed, original.last_reviewed);
        assert_eq!(block.aligned_with, vec!["docs/a.md".to_string()]);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("split".parse::<OverlapStrategy>().unwrap(), OverlapStrategy::Split);
        assert!("merge".parse::<OverlapStrategy>().is_err());
    }
}
