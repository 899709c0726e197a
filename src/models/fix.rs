//! Lint issues and the fix ledger

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::range::LineRange;
use super::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Mapped file no longer exists
    MissingFile,
    /// Block ends past the end of the file
    InvalidLines,
    /// Declaration moved away from the recorded range
    LineDrift,
    /// Aligned document or its heading does not resolve
    MissingAnchor,
    /// The map itself could not be parsed
    ParseError,
    /// A mapped file exists but could not be read
    ReadError,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingFile => "missing_file",
            Self::InvalidLines => "invalid_lines",
            Self::LineDrift => "line_drift",
            Self::MissingAnchor => "missing_anchor",
            Self::ParseError => "parse_error",
            Self::ReadError => "read_error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixAction {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
        }
    }
}

/// One lint finding and how it may be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixEntry {
    pub file: PathBuf,
    #[serde(default)]
    pub block: String,
    pub issue: IssueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_lines: Option<LineRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_lines: Option<LineRange>,
    pub action: FixAction,
    pub confidence: Confidence,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aligned_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap_with: Option<String>,
    /// Blocks elsewhere that point into a vanished file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned_refs: Vec<String>,
    /// The block's own `aligned_with`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aligns_with: Vec<String>,
    /// Blocks elsewhere that point at this block
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_by: Vec<String>,
}

impl FixEntry {
    pub fn new(
        file: impl Into<PathBuf>,
        block: impl Into<String>,
        issue: IssueKind,
        action: FixAction,
        description: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            block: block.into(),
            issue,
            old_lines: None,
            new_lines: None,
            action,
            confidence: Confidence::High,
            description: description.into(),
            reason: None,
            aligned_ref: None,
            overlap_with: None,
            orphaned_refs: Vec::new(),
            aligns_with: Vec::new(),
            referenced_by: Vec::new(),
        }
    }

    pub fn is_auto(&self) -> bool {
        self.action == FixAction::Auto
    }
}

/// The persisted `.alignment-map.fixes` document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixLedger {
    #[serde(default, with = "timestamp::optional")]
    pub generated: Option<NaiveDateTime>,
    #[serde(default)]
    pub fixes: Vec<FixEntry>,
}

impl FixLedger {
    pub fn new(fixes: Vec<FixEntry>) -> Self {
        Self {
            generated: Some(timestamp::now()),
            fixes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn auto_count(&self) -> usize {
        self.fixes.iter().filter(|f| f.is_auto()).count()
    }

    pub fn manual_count(&self) -> usize {
        self.fixes.len() - self.auto_count()
    }
}
