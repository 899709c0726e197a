//! Data model for alignment maps, check outcomes and lint fixes

pub mod block;
pub mod check;
pub mod document;
pub mod fix;
pub mod map;
pub mod range;
pub mod timestamp;

pub use block::{Block, FileMapping};
pub use check::{ChangeType, ChangedLine, CheckFailure, CheckResult, FileChange, Suggestion};
pub use document::DocumentSection;
pub use fix::{Confidence, FixAction, FixEntry, FixLedger, IssueKind};
pub use map::{
    block_label, normalize_path, AlignmentMap, Hierarchy, Reference, Settings, LEDGER_FILE_NAME,
    MAP_FILE_NAME,
};
pub use range::LineRange;
