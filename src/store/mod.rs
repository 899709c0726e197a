//! MapStore - alignment map and fix ledger persistence
//!
//! Every mutating command loads the map fresh, changes it in memory and
//! writes the whole document back. The write is refused if the file changed
//! on disk since it was loaded.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::AlignmentError;
use crate::models::{AlignmentMap, FixLedger};
use crate::parser::calculate_checksum;

/// A loaded map bound to the file it came from
pub struct MapStore {
    path: PathBuf,
    map: AlignmentMap,
    /// Checksum of the text read at load; `None` if the file did not exist
    loaded_checksum: Option<String>,
}

impl MapStore {
    /// Load and validate the map at `path`
    ///
    /// The project root is set to the map's directory.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read alignment map {}", path.display()))?;
        let map = parse_map(&content, &path)?;

        Ok(Self {
            map,
            loaded_checksum: Some(calculate_checksum(&content)),
            path,
        })
    }

    /// Load the map, or start a fresh one if the file does not exist yet
    pub fn load_or_init(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Self::load(path);
        }

        log::info!("Creating new alignment map at {}", path.display());
        let root = project_root_of(&path);
        Ok(Self {
            map: AlignmentMap::new().with_root(root),
            loaded_checksum: None,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn map(&self) -> &AlignmentMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut AlignmentMap {
        &mut self.map
    }

    /// Write the map back atomically
    pub fn save(&mut self) -> Result<()> {
        let on_disk = match std::fs::read_to_string(&self.path) {
            Ok(content) => Some(calculate_checksum(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to re-read alignment map {}", self.path.display())
                })
            }
        };
        if on_disk != self.loaded_checksum {
            return Err(AlignmentError::ConcurrentModification(self.path.clone()).into());
        }

        let content =
            serde_yaml::to_string(&self.map).context("Failed to serialize alignment map")?;
        write_atomic(&self.path, &content)?;

        self.loaded_checksum = Some(calculate_checksum(&content));
        log::debug!("Saved alignment map to {}", self.path.display());
        Ok(())
    }
}

/// Parse map text, setting the project root from `path`
pub fn parse_map(content: &str, path: &Path) -> Result<AlignmentMap> {
    let mut map: AlignmentMap = serde_yaml::from_str(content)
        .with_context(|| format!("Failed to parse alignment map {}", path.display()))?;

    for mapping in &map.mappings {
        if let Some((a, b)) = mapping.check_overlaps().first() {
            log::warn!(
                "{}: blocks '{}' ({}) and '{}' ({}) overlap",
                mapping.file.display(),
                a.name,
                a.lines,
                b.name,
                b.lines
            );
        }
        for name in mapping.duplicate_names() {
            log::warn!(
                "{}: block name '{}' is used more than once",
                mapping.file.display(),
                name
            );
        }
    }

    map.set_project_root(project_root_of(path));
    Ok(map)
}

fn project_root_of(map_path: &Path) -> PathBuf {
    match map_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    use std::io::Write;

    let dir = project_root_of(path);
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .context("Failed to write temp file")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

// =============================================================================
// Fix ledger
// =============================================================================

pub fn write_ledger(path: &Path, ledger: &FixLedger) -> Result<()> {
    let content = serde_yaml::to_string(ledger).context("Failed to serialize fix ledger")?;
    write_atomic(path, &content)
}

pub fn read_ledger(path: &Path) -> Result<FixLedger> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fix ledger {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse fix ledger {}", path.display()))
}

/// Delete the ledger if present; returns whether one existed
pub fn remove_ledger(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove fix ledger {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, FileMapping, FixAction, FixEntry, IssueKind, LineRange};
    use tempfile::TempDir;

    const MAP: &str = r#"version: 1
hierarchy:
  requires_human:
    - docs/architecture/*.md
  technical:
    - docs/**/*.md
mappings:
  - file: src/app.py
    blocks:
      - name: App class
        lines: 1-20
        last_updated: 2024-01-01T10:00:00
        last_update_comment: Initial mapping
        aligned_with:
          - docs/architecture/app.md#overview
      - name: helper function
        lines: 22-30
        aligned_with: []
"#;

    fn write_map(dir: &TempDir) -> PathBuf {
        let path = dir.path().join(".alignment-map.yaml");
        std::fs::write(&path, MAP).unwrap();
        path
    }

    fn tuples(map: &AlignmentMap) -> Vec<(PathBuf, String, LineRange, Vec<String>)> {
        map.mappings
            .iter()
            .flat_map(|m| {
                m.blocks.iter().map(move |b| {
                    (m.file.clone(), b.name.clone(), b.lines, b.aligned_with.clone())
                })
            })
            .collect()
    }

    #[test]
    fn test_load_sets_root() {
        let dir = TempDir::new().unwrap();
        let store = MapStore::load(write_map(&dir)).unwrap();
        assert_eq!(store.map().project_root().unwrap(), dir.path());
        assert_eq!(store.map().mappings[0].blocks.len(), 2);
        assert!(store.map().hierarchy.is_human_required("docs/architecture/app.md"));
    }

    #[test]
    fn test_save_then_reload_preserves_blocks() {
        let dir = TempDir::new().unwrap();
        let path = write_map(&dir);
        let mut store = MapStore::load(&path).unwrap();
        let before = tuples(store.map());
        store.save().unwrap();

        let reloaded = MapStore::load(&path).unwrap();
        assert_eq!(tuples(reloaded.map()), before);
        let block = &reloaded.map().mappings[0].blocks[0];
        assert_eq!(block.last_update_comment.as_deref(), Some("Initial mapping"));
        assert!(block.last_updated.is_some());
    }

    #[test]
    fn test_save_refuses_concurrent_modification() {
        let dir = TempDir::new().unwrap();
        let path = write_map(&dir);
        let mut store = MapStore::load(&path).unwrap();

        std::fs::write(&path, format!("{}\n# edited elsewhere\n", MAP)).unwrap();

        let err = store.save().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AlignmentError>(),
            Some(AlignmentError::ConcurrentModification(_))
        ));
    }

    #[test]
    fn test_load_or_init_creates_default_map() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".alignment-map.yaml");
        let mut store = MapStore::load_or_init(&path).unwrap();
        assert!(store.map().mappings.is_empty());
        assert_eq!(store.map().hierarchy.technical, vec!["docs/**/*.md".to_string()]);

        let mut mapping = FileMapping::new("src/new.py");
        mapping
            .add_block(Block::new("main function", LineRange::new(1, 4).unwrap()))
            .unwrap();
        store.map_mut().add_mapping(mapping).unwrap();
        store.save().unwrap();

        let reloaded = MapStore::load(&path).unwrap();
        assert_eq!(reloaded.map().mappings.len(), 1);
    }

    #[test]
    fn test_malformed_map_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".alignment-map.yaml");
        std::fs::write(&path, "mappings:\n  - file: a.py\n    blocks:\n      - name: X\n        lines: 9-3\n").unwrap();
        assert!(MapStore::load(&path).is_err());
    }

    #[test]
    fn test_duplicate_block_names_still_load() {
        let content = "mappings:\n  - file: a.py\n    blocks:\n      - name: X\n        lines: 1-3\n      - name: X\n        lines: 5-6\n";
        let map = parse_map(content, Path::new(".alignment-map.yaml")).unwrap();
        assert_eq!(map.mappings[0].duplicate_names(), vec!["X"]);
    }

    #[test]
    fn test_ledger_round_trip_and_remove() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".alignment-map.fixes");
        let mut entry = FixEntry::new(
            "src/gone.py",
            "",
            IssueKind::MissingFile,
            FixAction::Auto,
            "File not found: src/gone.py",
        );
        entry.orphaned_refs = vec!["src/other.py:OtherBlock".into()];
        write_ledger(&path, &FixLedger::new(vec![entry.clone()])).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("generated:"));
        assert!(text.contains("action: auto"));
        assert!(text.contains("issue: missing_file"));

        let ledger = read_ledger(&path).unwrap();
        assert_eq!(ledger.fixes, vec![entry]);
        assert!(remove_ledger(&path).unwrap());
        assert!(!remove_ledger(&path).unwrap());
    }
}
