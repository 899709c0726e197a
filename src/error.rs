//! Structural errors raised by map mutators.
//!
//! Classification outcomes (check failures, lint issues) are plain data and
//! never travel through this type.

use std::path::PathBuf;

use crate::models::LineRange;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignmentError {
    #[error("Block '{block}' ({lines}) overlaps with '{other}' ({other_lines})")]
    Overlap {
        block: String,
        lines: LineRange,
        other: String,
        other_lines: LineRange,
    },

    #[error("Block '{name}' not found in {}", file.display())]
    BlockNotFound { file: PathBuf, name: String },

    #[error("Block '{name}' already exists in {}", file.display())]
    DuplicateBlock { file: PathBuf, name: String },

    #[error("Mapping for {} already exists", .0.display())]
    MappingExists(PathBuf),

    #[error("No mapping for {}", .0.display())]
    MappingNotFound(PathBuf),

    #[error("Invalid line range: {0}")]
    InvalidLineRange(String),

    #[error("Project root not set on alignment map")]
    ProjectRootNotSet,

    #[error("{} was modified by another process since it was loaded", .0.display())]
    ConcurrentModification(PathBuf),
}
