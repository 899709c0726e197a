//! Review service - pre-flight summary before editing a file
//!
//! Lists, per block, the documents that will have to follow the change and
//! how much human attention that is likely to take.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::trace_service::{trace_block, ReferenceStatus, TracedBlock, TracedReference};
use crate::error::AlignmentError;
use crate::models::AlignmentMap;
use crate::parser::DocumentSource;
use crate::Result;

/// Longest section excerpt kept in a review
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ReviewRequirements {
    pub total_docs: usize,
    pub requires_human: usize,
    pub requires_update: usize,
    pub already_current: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minimal,
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn description(&self) -> &'static str {
        match self {
            Impact::Minimal => "All aligned documents are current",
            Impact::Low => "A few documents need a refresh",
            Impact::Medium => "Several documents need updating",
            Impact::High => "Human-owned documents are affected",
        }
    }
}

impl ReviewRequirements {
    pub fn impact(&self) -> Impact {
        if self.total_docs == 0 || self.already_current == self.total_docs {
            Impact::Minimal
        } else if self.requires_human > 0 {
            Impact::High
        } else if self.requires_update > 2 {
            Impact::Medium
        } else if self.requires_update > 0 {
            Impact::Low
        } else {
            Impact::Minimal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewReport {
    pub file: PathBuf,
    pub blocks: Vec<TracedBlock>,
    /// First reference to each distinct document
    pub documents: Vec<TracedReference>,
    pub requirements: ReviewRequirements,
    pub impact: Impact,
}

pub fn review<D: DocumentSource>(map: &AlignmentMap, docs: &D, file: &Path) -> Result<ReviewReport> {
    let mapping = map
        .get_mapping(file)
        .ok_or_else(|| AlignmentError::MappingNotFound(file.to_path_buf()))?;

    let mut blocks: Vec<TracedBlock> = mapping
        .blocks
        .iter()
        .map(|b| trace_block(map, docs, b))
        .collect();
    for block in &mut blocks {
        block.references.retain(|r| r.status != ReferenceStatus::CodeReference);
        for reference in &mut block.references {
            reference.section = reference.section.take().map(|s| preview(&s));
        }
    }

    let mut seen = HashSet::new();
    let documents: Vec<TracedReference> = blocks
        .iter()
        .flat_map(|b| b.references.iter())
        .filter(|r| seen.insert(r.path.clone()))
        .cloned()
        .collect();

    let requirements = ReviewRequirements {
        total_docs: documents.len(),
        requires_human: documents.iter().filter(|d| d.requires_human).count(),
        requires_update: documents.iter().filter(|d| d.status.needs_review()).count(),
        already_current: documents
            .iter()
            .filter(|d| d.status == ReferenceStatus::Current)
            .count(),
    };

    Ok(ReviewReport {
        file: file.to_path_buf(),
        blocks,
        documents,
        impact: requirements.impact(),
        requirements,
    })
}

fn preview(section: &str) -> String {
    match section.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &section[..idx]),
        None => section.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, DocumentSection, FileMapping, LineRange};
    use chrono::{NaiveDate, NaiveDateTime};

    struct Docs;

    impl DocumentSource for Docs {
        fn exists(&self, doc_path: &str) -> bool {
            doc_path != "docs/missing.md"
        }

        fn last_reviewed(&self, doc_path: &str) -> Option<NaiveDateTime> {
            let day = if doc_path == "docs/fresh.md" { 20 } else { 1 };
            NaiveDate::from_ymd_opt(2024, 5, day).and_then(|d| d.and_hms_opt(0, 0, 0))
        }

        fn extract_section(&self, doc_path: &str, anchor: &str) -> Option<DocumentSection> {
            Some(DocumentSection {
                path: PathBuf::from(doc_path),
                anchor: anchor.to_string(),
                title: anchor.to_string(),
                content: "x".repeat(300),
                last_reviewed: None,
            })
        }
    }

    fn block(name: &str, start: usize, end: usize, refs: &[&str]) -> Block {
        let mut block = Block::new(name, LineRange::new(start, end).unwrap())
            .with_aligned(refs.iter().map(|r| r.to_string()).collect());
        block.last_updated = NaiveDate::from_ymd_opt(2024, 5, 10).and_then(|d| d.and_hms_opt(0, 0, 0));
        block
    }

    fn map_with(blocks: Vec<Block>) -> AlignmentMap {
        let mut map = AlignmentMap::new();
        map.hierarchy.requires_human = vec!["docs/IDENTITY.md".into()];
        let mut mapping = FileMapping::new("src/a.py");
        for b in blocks {
            mapping.add_block(b).unwrap();
        }
        map.add_mapping(mapping).unwrap();
        map
    }

    #[test]
    fn test_review_counts_unique_documents() {
        let map = map_with(vec![
            block("A", 1, 5, &["docs/design.md#a", "docs/fresh.md", "src/b.py#helper"]),
            block("B", 6, 9, &["docs/design.md#b", "docs/missing.md"]),
        ]);

        let report = review(&map, &Docs, Path::new("src/a.py")).unwrap();
        assert_eq!(report.documents.len(), 3);
        assert_eq!(
            report.requirements,
            ReviewRequirements {
                total_docs: 3,
                requires_human: 0,
                requires_update: 2,
                already_current: 1,
            }
        );
        assert_eq!(report.impact, Impact::Low);
        assert_eq!(report.blocks[0].references.len(), 2);

        let section = report.blocks[0].references[0].section.as_deref().unwrap();
        assert!(section.ends_with("..."));
        assert_eq!(section.len(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_impact_levels() {
        let human = map_with(vec![block("A", 1, 5, &["docs/IDENTITY.md"])]);
        assert_eq!(review(&human, &Docs, Path::new("src/a.py")).unwrap().impact, Impact::High);

        let current = map_with(vec![block("A", 1, 5, &["docs/fresh.md"])]);
        assert_eq!(review(&current, &Docs, Path::new("src/a.py")).unwrap().impact, Impact::Minimal);

        let many = map_with(vec![block("A", 1, 5, &["docs/a.md", "docs/b.md", "docs/c.md"])]);
        assert_eq!(review(&many, &Docs, Path::new("src/a.py")).unwrap().impact, Impact::Medium);

        let empty = map_with(vec![block("A", 1, 5, &[])]);
        assert_eq!(review(&empty, &Docs, Path::new("src/a.py")).unwrap().impact, Impact::Minimal);
    }

    #[test]
    fn test_unmapped_file() {
        let map = map_with(vec![]);
        assert!(review(&map, &Docs, Path::new("src/other.py")).is_err());
    }
}
