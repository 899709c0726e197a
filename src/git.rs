//! Git queries for changed lines
//!
//! Paths handed out here are relative to the project root (the directory of
//! the alignment map), which may sit below the repository work tree. Files
//! outside the project root are left out.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Delta, Diff, DiffOptions, Patch, Repository};

use crate::models::{ChangedLine, FileChange};
use crate::parser::parse_unified_diff;

/// Work tree root of the repository containing `start`
pub fn repo_root(start: &Path) -> Result<PathBuf> {
    let repo = open(start)?;
    workdir(&repo)
}

/// Changes staged in the index, compared with HEAD
///
/// On an unborn branch everything in the index counts as added.
pub fn staged_changes(project_root: &Path) -> Result<Vec<FileChange>> {
    collect_changes(project_root, None, true)
}

/// Changes in the work tree not yet staged
pub fn unstaged_changes(project_root: &Path) -> Result<Vec<FileChange>> {
    collect_changes(project_root, None, false)
}

/// Changed lines of one project-relative file
pub fn changed_lines(project_root: &Path, file: &Path, staged: bool) -> Result<Vec<ChangedLine>> {
    let changes = collect_changes(project_root, Some(file), staged)?;
    Ok(changes.into_iter().flat_map(|c| c.lines).collect())
}

/// Whether `file` has staged changes
pub fn is_file_staged(project_root: &Path, file: &Path) -> Result<bool> {
    let changes = collect_changes(project_root, Some(file), true)?;
    Ok(!changes.is_empty())
}

/// Hooks directory of the repository containing `start`
pub fn hooks_dir(start: &Path) -> Result<PathBuf> {
    let repo = open(start)?;
    Ok(repo.path().join("hooks"))
}

fn open(start: &Path) -> Result<Repository> {
    Repository::discover(start)
        .with_context(|| format!("Not a git repository: {}", start.display()))
}

fn workdir(repo: &Repository) -> Result<PathBuf> {
    let dir = repo
        .workdir()
        .context("Bare repositories are not supported")?;
    dir.canonicalize()
        .with_context(|| format!("Failed to resolve {}", dir.display()))
}

fn collect_changes(
    project_root: &Path,
    only: Option<&Path>,
    staged: bool,
) -> Result<Vec<FileChange>> {
    let repo = open(project_root)?;
    let workdir = workdir(&repo)?;
    let root = project_root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", project_root.display()))?;

    let mut opts = DiffOptions::new();
    opts.context_lines(0);
    if let Some(file) = only {
        let in_repo = root.join(file);
        let spec = in_repo.strip_prefix(&workdir).unwrap_or(file);
        opts.pathspec(spec);
        opts.disable_pathspec_match(true);
    }

    let diff = if staged {
        let head = repo.head().ok().and_then(|h| h.peel_to_tree().ok());
        repo.diff_tree_to_index(head.as_ref(), None, Some(&mut opts))
            .context("Failed to diff HEAD against the index")?
    } else {
        repo.diff_index_to_workdir(None, Some(&mut opts))
            .context("Failed to diff the index against the work tree")?
    };

    file_changes(&diff, &workdir, &root)
}

fn file_changes(diff: &Diff<'_>, workdir: &Path, root: &Path) -> Result<Vec<FileChange>> {
    let mut changes = Vec::new();

    for (index, delta) in diff.deltas().enumerate() {
        if delta.status() == Delta::Deleted {
            continue;
        }
        let Some(repo_path) = delta.new_file().path() else {
            continue;
        };
        let Ok(path) = workdir.join(repo_path).strip_prefix(root).map(Path::to_path_buf) else {
            log::debug!("Skipping {} outside the project", repo_path.display());
            continue;
        };

        let lines = match Patch::from_diff(diff, index)? {
            Some(mut patch) => {
                let buf = patch
                    .to_buf()
                    .with_context(|| format!("Failed to render diff for {}", path.display()))?;
                parse_unified_diff(&String::from_utf8_lossy(&buf))
            }
            None => Vec::new(),
        };
        changes.push(FileChange::new(path, lines));
    }

    Ok(changes)
}
