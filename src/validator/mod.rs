pub mod drift;
pub mod fix;
pub mod lint;

pub use drift::{detect_line_drift, locate_block};
pub use fix::{apply_fixes, ApplyReport};
pub use lint::{lint_map_file, Linter};
