pub mod diff;
pub mod documents;
pub mod frontmatter;
pub mod markdown;

pub use diff::parse_unified_diff;
pub use documents::{DocumentSource, FsDocuments};
pub use frontmatter::{calculate_checksum, extract_last_reviewed, normalize_content, split_frontmatter};
pub use markdown::{collect_headings, extract_section, slugify, Heading, Section};

/// Number of lines in a source file
pub fn count_lines(content: &str) -> usize {
    content.lines().count()
}
