//! Project discovery
//!
//! Resolves which alignment map a command works on and the project root
//! it implies. Priority: an explicit map path, then the nearest
//! `.alignment-map.yaml` above the working directory, then the git work
//! tree root.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::git;
use crate::models::{LEDGER_FILE_NAME, MAP_FILE_NAME};
use crate::parser::FsDocuments;
use crate::store::MapStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// Directory holding the map; every mapped path is relative to it
    pub root: PathBuf,
    pub map_path: PathBuf,
}

impl ProjectContext {
    /// Discover from the current directory
    pub fn discover(mapfile: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Self::discover_from(&cwd, mapfile)
    }

    pub fn discover_from(start: &Path, mapfile: Option<&Path>) -> Result<Self> {
        if let Some(mapfile) = mapfile {
            let map_path = if mapfile.is_absolute() {
                mapfile.to_path_buf()
            } else {
                start.join(mapfile)
            };
            return Ok(Self::from_map_path(map_path));
        }

        if let Some(dir) = start.ancestors().find(|d| d.join(MAP_FILE_NAME).is_file()) {
            log::debug!("Found {} in {}", MAP_FILE_NAME, dir.display());
            return Ok(Self::from_map_path(dir.join(MAP_FILE_NAME)));
        }

        match git::repo_root(start) {
            Ok(root) => Ok(Self::from_map_path(root.join(MAP_FILE_NAME))),
            Err(_) => bail!(
                "Could not find {} in directory tree. Use --mapfile to specify the path explicitly.",
                MAP_FILE_NAME
            ),
        }
    }

    pub fn from_map_path(map_path: impl Into<PathBuf>) -> Self {
        let map_path = map_path.into();
        let root = match map_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self { root, map_path }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE_NAME)
    }

    /// The map file relative to the project root
    pub fn map_file(&self) -> PathBuf {
        self.project_path(&self.map_path)
    }

    /// Load the existing map
    pub fn load_map(&self) -> Result<MapStore> {
        if !self.map_path.exists() {
            bail!("Alignment map not found: {}", self.map_path.display());
        }
        MapStore::load(&self.map_path)
    }

    pub fn documents(&self, fuzzy: bool) -> FsDocuments {
        FsDocuments::new(&self.root, fuzzy)
    }

    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// A user-supplied path expressed relative to the project root
    ///
    /// Absolute paths under the root are stripped; anything else is kept.
    pub fn project_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            if let Ok(rel) = path.strip_prefix(&self.root) {
                return rel.to_path_buf();
            }
            if let Ok(root) = self.root.canonicalize() {
                if let Ok(rel) = path.strip_prefix(root) {
                    return rel.to_path_buf();
                }
            }
        }
        crate::models::normalize_path(path)
    }
}
