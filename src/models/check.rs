//! Change-set inputs and staleness check outcomes

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::range::LineRange;

/// How a line took part in a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
}

/// One changed line, numbered in the new version of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangedLine {
    pub line_number: usize,
    pub change_type: ChangeType,
}

impl ChangedLine {
    pub fn added(line_number: usize) -> Self {
        Self {
            line_number,
            change_type: ChangeType::Added,
        }
    }
}

/// All changed lines of one file in a change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub lines: Vec<ChangedLine>,
    pub is_map_file: bool,
}

impl FileChange {
    pub fn new(path: impl Into<PathBuf>, lines: Vec<ChangedLine>) -> Self {
        Self {
            path: path.into(),
            lines,
            is_map_file: false,
        }
    }

    /// Line numbers that exist in the new file (additions only)
    pub fn added_lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines
            .iter()
            .filter(|l| l.change_type == ChangeType::Added)
            .map(|l| l.line_number)
    }
}

/// Outcome kinds of a staleness check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    UnmappedFile,
    UnmappedLines,
    MapNotUpdated,
    StaleDoc,
    HumanEscalation,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmappedFile => write!(f, "UNMAPPED_FILE"),
            Self::UnmappedLines => write!(f, "UNMAPPED_LINES"),
            Self::MapNotUpdated => write!(f, "MAP_NOT_UPDATED"),
            Self::StaleDoc => write!(f, "STALE_DOC"),
            Self::HumanEscalation => write!(f, "HUMAN_ESCALATION"),
        }
    }
}

/// What the user can do about a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// Add a mapping for the whole file
    MapFile,
    /// Grow the nearest block to cover the line
    ExtendBlock { block: String, lines: LineRange },
    /// No blocks nearby, start a new one
    NewBlock { line: usize },
    /// Bump the block's `last_updated` and comment
    UpdateBlockEntry { block: String, lines: LineRange },
    /// The document carries no review stamp at all
    AddLastReviewed { doc: String },
    /// Re-read the document and bump its review stamp
    ReviewDocument { doc: String },
    /// Same, but a human must do it
    HumanReview { doc: String },
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MapFile => write!(f, "Add a mapping for this file to the alignment map"),
            Self::ExtendBlock { block, lines } => {
                write!(f, "Extend '{}' to lines {} or add a new block", block, lines)
            }
            Self::NewBlock { line } => write!(f, "Add a new block covering line {}", line),
            Self::UpdateBlockEntry { block, lines } => write!(
                f,
                "Update '{}' ({}) in the alignment map with a new last_updated and comment",
                block, lines
            ),
            Self::AddLastReviewed { doc } => write!(f, "Add a last_reviewed field to {}", doc),
            Self::ReviewDocument { doc } => {
                write!(f, "Review {} and update its last_reviewed", doc)
            }
            Self::HumanReview { doc } => {
                write!(f, "Have a human review {} and update last_reviewed", doc)
            }
        }
    }
}

/// A single check failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFailure {
    pub result: CheckResult,
    pub file: PathBuf,
    pub message: String,
    /// Owning block, or the nearest one for unmapped lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_lines: Option<LineRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aligned_doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

impl CheckFailure {
    pub fn new(result: CheckResult, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            result,
            file: file.into(),
            message: message.into(),
            block: None,
            block_lines: None,
            line: None,
            aligned_doc: None,
            doc_section: None,
            suggestion: None,
        }
    }

    /// Key used to collapse repeated hits on one block
    pub fn dedup_key(&self) -> (PathBuf, CheckResult, Option<String>) {
        (self.file.clone(), self.result, self.block.clone())
    }
}
