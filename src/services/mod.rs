//! Service layer for alignment-map
//!
//! Each service is one command's behaviour over a `ProjectContext`, with a
//! pure in-memory core where the command mutates the map. The CLI only
//! renders what these return.

pub mod check_service;
pub mod graph_service;
pub mod hook_service;
pub mod lint_service;
pub mod review_service;
pub mod suggest_service;
pub mod touch_service;
pub mod trace_service;
pub mod update_service;

// Re-export commonly used types
pub use check_service::{check_project, CheckOutcome};
pub use graph_service::{AlignmentGraph, GraphEdge, GraphNode, GraphStats, NodeKind};
pub use hook_service::{install_hook, install_project_hook, HookInstall};
pub use lint_service::{apply_project_fixes, lint_project, ApplyOutcome, LintOutcome};
pub use review_service::{review, Impact, ReviewReport, ReviewRequirements};
pub use suggest_service::{
    find_candidate_files, suggest, suggest_for_source, BlockSuggestion, FileSuggestions,
};
pub use touch_service::{touch_block, touch_in_map, TouchOutcome};
pub use trace_service::{
    parse_location, resolve_reference, trace, ReferenceStatus, TraceReport, TracedBlock,
    TracedReference,
};
pub use update_service::{
    apply_update, suggest_strategy, update_block, AppliedUpdate, OverlapConflict,
    OverlapStrategy, UpdateChange, UpdateOutcome, UpdateRequest,
};
