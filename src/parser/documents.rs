//! Document access for staleness checks and lint

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use super::frontmatter::extract_last_reviewed;
use super::markdown::extract_section;
use crate::models::DocumentSection;

/// Read access to aligned documents, addressed by project-relative path
pub trait DocumentSource {
    fn exists(&self, doc_path: &str) -> bool;

    /// `last_reviewed` from front matter or an inline marker
    fn last_reviewed(&self, doc_path: &str) -> Option<NaiveDateTime>;

    /// The section headed by `anchor`
    fn extract_section(&self, doc_path: &str, anchor: &str) -> Option<DocumentSection>;
}

/// Documents read from the project directory
pub struct FsDocuments {
    root: PathBuf,
    fuzzy: bool,
}

impl FsDocuments {
    pub fn new(root: impl Into<PathBuf>, fuzzy: bool) -> Self {
        Self {
            root: root.into(),
            fuzzy,
        }
    }

    fn read(&self, doc_path: &str) -> Option<String> {
        let path = self.root.join(doc_path);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) => {
                log::debug!("Cannot read {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl DocumentSource for FsDocuments {
    fn exists(&self, doc_path: &str) -> bool {
        self.root.join(doc_path).is_file()
    }

    fn last_reviewed(&self, doc_path: &str) -> Option<NaiveDateTime> {
        self.read(doc_path).and_then(|c| extract_last_reviewed(&c))
    }

    fn extract_section(&self, doc_path: &str, anchor: &str) -> Option<DocumentSection> {
        let content = self.read(doc_path)?;
        let section = extract_section(&content, anchor, self.fuzzy)?;
        Some(DocumentSection {
            path: Path::new(doc_path).to_path_buf(),
            anchor: anchor.to_string(),
            title: section.title,
            content: section.content,
            last_reviewed: extract_last_reviewed(&content),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_documents() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(
            dir.path().join("docs/design.md"),
            "---\nlast_reviewed: 2024-06-01\n---\n# Design\n\n## Cache\n\nLRU.\n",
        )
        .unwrap();

        let docs = FsDocuments::new(dir.path(), true);
        assert!(docs.exists("docs/design.md"));
        assert!(!docs.exists("docs/missing.md"));
        assert!(docs.last_reviewed("docs/design.md").is_some());
        assert!(docs.last_reviewed("docs/missing.md").is_none());

        let section = docs.extract_section("docs/design.md", "cache").unwrap();
        assert_eq!(section.title, "Cache");
        assert!(section.last_reviewed.is_some());
        assert!(docs.extract_section("docs/design.md", "nope").is_none());
    }
}
