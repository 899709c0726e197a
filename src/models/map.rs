//! The alignment map document

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::block::{Block, FileMapping};
use crate::error::AlignmentError;

/// Default map file name at the project root
pub const MAP_FILE_NAME: &str = ".alignment-map.yaml";

/// Default fix ledger file name, next to the map
pub const LEDGER_FILE_NAME: &str = ".alignment-map.fixes";

// =============================================================================
// Hierarchy
// =============================================================================

/// Glob patterns classifying documentation paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    #[serde(default)]
    pub requires_human: Vec<String>,
    #[serde(default)]
    pub technical: Vec<String>,
}

impl Hierarchy {
    /// Whether staleness of `doc_path` needs human sign-off
    pub fn is_human_required(&self, doc_path: &str) -> bool {
        matches_any(&self.requires_human, doc_path)
    }

    pub fn is_technical(&self, doc_path: &str) -> bool {
        matches_any(&self.technical, doc_path)
    }
}

fn matches_any(patterns: &[String], path: &str) -> bool {
    let path = path.trim_start_matches("./");
    patterns.iter().any(|pattern| match glob::Pattern::new(pattern) {
        Ok(p) => p.matches(path),
        Err(e) => {
            log::warn!("Ignoring invalid hierarchy pattern '{}': {}", pattern, e);
            false
        }
    })
}

// =============================================================================
// Settings
// =============================================================================

fn default_line_tolerance() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_code_prefixes() -> Vec<String> {
    vec!["src/".to_string()]
}

fn is_default_code_prefixes(prefixes: &[String]) -> bool {
    prefixes == default_code_prefixes().as_slice()
}

/// Tunables stored under `settings:`
///
/// Unknown keys are kept so a rewrite never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// How far past a changed line the "extend nearest block" hint reaches
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: usize,
    /// Loose anchor-to-heading matching
    #[serde(default = "default_true")]
    pub fuzzy_match: bool,
    /// Treat any uncovered line of a mapped file as a gap
    #[serde(default)]
    pub require_complete_coverage: bool,
    /// Path prefixes marking an `aligned_with` entry as a code reference
    #[serde(
        default = "default_code_prefixes",
        skip_serializing_if = "is_default_code_prefixes"
    )]
    pub code_prefixes: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_tolerance: default_line_tolerance(),
            fuzzy_match: true,
            require_complete_coverage: false,
            code_prefixes: default_code_prefixes(),
            extra: BTreeMap::new(),
        }
    }
}

// =============================================================================
// References
// =============================================================================

/// A parsed `aligned_with` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub raw: String,
    /// Path part, before `#` and before any `:`
    pub path: String,
    pub anchor: Option<String>,
    /// Points at code rather than documentation
    pub is_code: bool,
}

impl Reference {
    /// Split `path[#anchor]`; code references are recognised by a reserved
    /// prefix or an embedded `:`
    pub fn parse(raw: &str, code_prefixes: &[String]) -> Self {
        let (head, anchor) = match raw.split_once('#') {
            Some((head, anchor)) => (head, Some(anchor.to_string())),
            None => (raw, None),
        };

        let is_code = raw.contains(':') || code_prefixes.iter().any(|p| head.starts_with(p));

        let (path, anchor) = match head.split_once(':') {
            Some((path, block)) if anchor.is_none() && !block.is_empty() => {
                (path, Some(block.to_string()))
            }
            Some((path, _)) => (path, anchor),
            None => (head, anchor),
        };

        Self {
            raw: raw.to_string(),
            path: path.trim_start_matches("./").to_string(),
            anchor,
            is_code,
        }
    }

    /// Whether this reference lands on `file`
    pub fn targets_file(&self, file: &Path) -> bool {
        normalize_path(Path::new(&self.path)) == normalize_path(file)
    }

    /// Whether this reference lands on `block` of `file`
    pub fn targets_block(&self, file: &Path, block: &Block) -> bool {
        self.targets_file(file) && self.anchor.as_deref().is_some_and(|a| block.is_named(a))
    }
}

/// Drop `.` components so `./src/a.py` and `src/a.py` compare equal
pub fn normalize_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

// =============================================================================
// AlignmentMap
// =============================================================================

fn default_version() -> u32 {
    1
}

/// The whole map document, rooted at a project directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentMap {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub hierarchy: Hierarchy,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub mappings: Vec<FileMapping>,
    #[serde(skip)]
    project_root: Option<PathBuf>,
}

impl Default for AlignmentMap {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignmentMap {
    /// An empty map with the default hierarchy for new projects
    pub fn new() -> Self {
        Self {
            version: 1,
            hierarchy: Hierarchy {
                requires_human: Vec::new(),
                technical: vec!["docs/**/*.md".to_string()],
            },
            settings: Settings::default(),
            mappings: Vec::new(),
            project_root: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn set_project_root(&mut self, root: impl Into<PathBuf>) {
        self.project_root = Some(root.into());
    }

    pub fn project_root(&self) -> Result<&Path, AlignmentError> {
        self.project_root
            .as_deref()
            .ok_or(AlignmentError::ProjectRootNotSet)
    }

    /// Resolve a project-relative path
    pub fn resolve(&self, relative: impl AsRef<Path>) -> Result<PathBuf, AlignmentError> {
        Ok(self.project_root()?.join(relative))
    }

    pub fn get_mapping(&self, file: &Path) -> Option<&FileMapping> {
        let wanted = normalize_path(file);
        self.mappings
            .iter()
            .find(|m| normalize_path(&m.file) == wanted)
    }

    pub fn get_mapping_mut(&mut self, file: &Path) -> Option<&mut FileMapping> {
        let wanted = normalize_path(file);
        self.mappings
            .iter_mut()
            .find(|m| normalize_path(&m.file) == wanted)
    }

    pub fn add_mapping(&mut self, mapping: FileMapping) -> Result<(), AlignmentError> {
        if self.get_mapping(&mapping.file).is_some() {
            return Err(AlignmentError::MappingExists(mapping.file));
        }
        self.mappings.push(mapping);
        Ok(())
    }

    pub fn remove_mapping(&mut self, file: &Path) -> Result<FileMapping, AlignmentError> {
        let wanted = normalize_path(file);
        let index = self
            .mappings
            .iter()
            .position(|m| normalize_path(&m.file) == wanted)
            .ok_or_else(|| AlignmentError::MappingNotFound(file.to_path_buf()))?;
        Ok(self.mappings.remove(index))
    }

    pub fn parse_reference(&self, raw: &str) -> Reference {
        Reference::parse(raw, &self.settings.code_prefixes)
    }

    /// Labels (`file:block`) of blocks in other files that reference `file`
    pub fn references_to_file(&self, file: &Path) -> Vec<String> {
        let wanted = normalize_path(file);
        self.referencing_blocks(|mapping, reference| {
            normalize_path(&mapping.file) != wanted && reference.targets_file(file)
        })
    }

    /// Labels of blocks (other than `block` itself) that reference `block`
    pub fn references_to_block(&self, file: &Path, block: &Block) -> Vec<String> {
        let wanted = normalize_path(file);
        let mut labels = Vec::new();
        for mapping in &self.mappings {
            for other in &mapping.blocks {
                if normalize_path(&mapping.file) == wanted && other.name == block.name {
                    continue;
                }
                let hit = other
                    .aligned_with
                    .iter()
                    .map(|raw| self.parse_reference(raw))
                    .any(|r| r.targets_block(file, block));
                if hit {
                    labels.push(block_label(&mapping.file, &other.name));
                }
            }
        }
        labels
    }

    fn referencing_blocks<F>(&self, mut predicate: F) -> Vec<String>
    where
        F: FnMut(&FileMapping, &Reference) -> bool,
    {
        let mut labels = Vec::new();
        for mapping in &self.mappings {
            for block in &mapping.blocks {
                let hit = block
                    .aligned_with
                    .iter()
                    .map(|raw| self.parse_reference(raw))
                    .any(|r| predicate(mapping, &r));
                if hit {
                    labels.push(block_label(&mapping.file, &block.name));
                }
            }
        }
        labels
    }
}

/// `file:block` label used in reports
pub fn block_label(file: &Path, block: &str) -> String {
    format!("{}:{}", file.display(), block)
}
