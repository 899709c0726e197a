//! Shared fixtures: a throwaway git repository holding a mapped project

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use alignment_map::models::MAP_FILE_NAME;
use alignment_map::ProjectContext;
use git2::{IndexAddOption, Repository, Signature};
use tempfile::TempDir;

pub const APP_PY: &str = "class App:\n    def run(self):\n        return 1\n";

pub const DESIGN_MD: &str = "# Design\n\n## Overview\n\nThe app runs once.\n\n## Details\n\nMore.\n";

pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative)).unwrap()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn stage_all(&self) {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
    }

    pub fn commit_all(&self) {
        self.stage_all();
        let mut index = self.repo.index().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parents)
            .unwrap();
    }

    pub fn ctx(&self) -> ProjectContext {
        ProjectContext::from_map_path(self.dir.path().join(MAP_FILE_NAME))
    }
}

/// A one-block map aligning `src/app.py` to `doc`
pub fn app_map(doc: &str, last_updated: &str) -> String {
    format!(
        "version: 1
hierarchy:
  requires_human:
    - docs/IDENTITY.md
  technical:
    - docs/**/*.md
mappings:
  - file: src/app.py
    blocks:
      - name: App class
        lines: 1-3
        last_updated: '{}'
        aligned_with:
          - {}
",
        last_updated, doc
    )
}

/// Doc text carrying a `last_reviewed` front-matter stamp
pub fn reviewed_doc(stamp: &str, body: &str) -> String {
    format!("---\nlast_reviewed: {}\n---\n{}", stamp, body)
}
