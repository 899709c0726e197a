//! Line drift detection

use crate::locator::{extract_target_name, DeclarationLocator};
use crate::models::LineRange;

/// Where the block's declaration actually lives now
///
/// `None` when the declaration cannot be found (unverifiable).
pub fn locate_block(
    locator: &dyn DeclarationLocator,
    source: &str,
    block_name: &str,
) -> Option<LineRange> {
    locator.find(source, extract_target_name(block_name))
}

/// The block's true range if it differs from `recorded`
///
/// Returns `None` both when the block is in place and when it cannot be
/// verified.
pub fn detect_line_drift(
    locator: &dyn DeclarationLocator,
    source: &str,
    block_name: &str,
    recorded: LineRange,
) -> Option<LineRange> {
    locate_block(locator, source, block_name).filter(|actual| *actual != recorded)
}
