//! Blocks and per-file mappings
//!
//! A `FileMapping` owns an ordered list of named blocks whose line ranges
//! never overlap. Every mutator either preserves that or fails leaving the
//! mapping untouched.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::range::LineRange;
use super::timestamp;
use crate::error::AlignmentError;

/// A named line range, optionally linked to documentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub lines: LineRange,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::optional"
    )]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_comment: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::optional"
    )]
    pub last_reviewed: Option<NaiveDateTime>,
    #[serde(default)]
    pub aligned_with: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Block {
    pub fn new(name: impl Into<String>, lines: LineRange) -> Self {
        Self {
            name: name.into(),
            lines,
            last_updated: None,
            last_update_comment: None,
            last_reviewed: None,
            aligned_with: Vec::new(),
            id: None,
        }
    }

    pub fn with_aligned(mut self, aligned_with: Vec<String>) -> Self {
        self.aligned_with = aligned_with;
        self
    }

    /// Stamp the block as changed now
    pub fn touch(&mut self, comment: Option<&str>) {
        self.last_updated = Some(timestamp::now());
        if let Some(comment) = comment {
            self.last_update_comment = Some(comment.to_string());
        }
    }

    /// True when a reference anchor names this block
    pub fn is_named(&self, anchor: &str) -> bool {
        self.name == anchor || self.id.as_deref() == Some(anchor)
    }
}

/// All blocks recorded for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    pub file: PathBuf,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl FileMapping {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            blocks: Vec::new(),
        }
    }

    pub fn get_block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn get_block_mut(&mut self, name: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.name == name)
    }

    /// The block containing `line`; at most one can match
    pub fn find_block_for_line(&self, line: usize) -> Option<&Block> {
        self.blocks.iter().find(|b| b.lines.contains(line))
    }

    /// The block whose nearer endpoint is closest to `line`
    ///
    /// Ties go to the block listed first.
    pub fn find_nearest_block(&self, line: usize) -> Option<&Block> {
        self.blocks.iter().fold(None, |best: Option<&Block>, block| match best {
            Some(current) if current.lines.distance_to(line) <= block.lines.distance_to(line) => {
                Some(current)
            }
            _ => Some(block),
        })
    }

    /// Blocks whose range intersects `range`, skipping the block named `exclude`
    pub fn overlapping_blocks(&self, range: &LineRange, exclude: Option<&str>) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|b| Some(b.name.as_str()) != exclude)
            .filter(|b| b.lines.overlaps(range))
            .collect()
    }

    /// Every pair of blocks that overlap each other
    pub fn check_overlaps(&self) -> Vec<(&Block, &Block)> {
        let mut pairs = Vec::new();
        for (i, a) in self.blocks.iter().enumerate() {
            for b in &self.blocks[i + 1..] {
                if a.lines.overlaps(&b.lines) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }

    /// Names carried by more than one block, in first-seen order
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut duplicates: Vec<&str> = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            let name = block.name.as_str();
            if self.blocks[..i].iter().any(|b| b.name == name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// Append a block, rejecting overlaps and duplicate names
    pub fn add_block(&mut self, block: Block) -> Result<(), AlignmentError> {
        if self.get_block(&block.name).is_some() {
            return Err(AlignmentError::DuplicateBlock {
                file: self.file.clone(),
                name: block.name,
            });
        }
        self.ensure_free(&block.name, &block.lines, None)?;
        self.blocks.push(block);
        Ok(())
    }

    /// Remove and return the named block
    pub fn remove_block(&mut self, name: &str) -> Result<Block, AlignmentError> {
        let index = self.index_of(name)?;
        Ok(self.blocks.remove(index))
    }

    /// Move a block to new lines and stamp it as updated now
    pub fn update_block_lines(
        &mut self,
        name: &str,
        lines: LineRange,
        comment: Option<&str>,
    ) -> Result<(), AlignmentError> {
        let index = self.index_of(name)?;
        self.ensure_free(name, &lines, Some(name))?;
        let block = &mut self.blocks[index];
        block.lines = lines;
        block.touch(comment);
        Ok(())
    }

    /// Move a block without touching its timestamp
    ///
    /// Used when the code itself did not change, only its position.
    pub fn relocate_block(&mut self, name: &str, lines: LineRange) -> Result<(), AlignmentError> {
        let index = self.index_of(name)?;
        self.ensure_free(name, &lines, Some(name))?;
        self.blocks[index].lines = lines;
        Ok(())
    }

    /// Fraction of `line_count` lines covered by blocks
    pub fn coverage(&self, line_count: usize) -> f64 {
        if line_count == 0 {
            return 1.0;
        }
        let covered: usize = self
            .blocks
            .iter()
            .map(|b| b.lines.end().min(line_count).saturating_sub(b.lines.start() - 1))
            .sum();
        covered as f64 / line_count as f64
    }

    fn index_of(&self, name: &str) -> Result<usize, AlignmentError> {
        self.blocks
            .iter()
            .position(|b| b.name == name)
            .ok_or_else(|| AlignmentError::BlockNotFound {
                file: self.file.clone(),
                name: name.to_string(),
            })
    }

    fn ensure_free(
        &self,
        name: &str,
        lines: &LineRange,
        exclude: Option<&str>,
    ) -> Result<(), AlignmentError> {
        match self.overlapping_blocks(lines, exclude).first() {
            Some(other) => Err(AlignmentError::Overlap {
                block: name.to_string(),
                lines: *lines,
                other: other.name.clone(),
                other_lines: other.lines,
            }),
            None => Ok(()),
        }
    }
}
