//! Hook service - install the pre-commit check

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::context::ProjectContext;
use crate::git;
use crate::models::MAP_FILE_NAME;
use crate::Result;

const HOOK_MARKER: &str = "alignment-map check";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookInstall {
    Created,
    /// A foreign hook existed; the check was appended to it
    Appended,
    AlreadyInstalled,
}

/// The command the hook runs from the repository root
pub fn hook_command(ctx: &ProjectContext, repo_root: &Path) -> String {
    let map_path = ctx.map_path.canonicalize().unwrap_or_else(|_| ctx.map_path.clone());
    match map_path.strip_prefix(repo_root) {
        Ok(relative) if relative == Path::new(MAP_FILE_NAME) => HOOK_MARKER.to_string(),
        Ok(relative) => format!("{} --mapfile {}", HOOK_MARKER, relative.display()),
        Err(_) => format!("{} --mapfile {}", HOOK_MARKER, map_path.display()),
    }
}

/// Write or extend `hooks_dir/pre-commit` so it runs `command`
pub fn install_hook(hooks_dir: &Path, command: &str) -> Result<(PathBuf, HookInstall)> {
    let hook_path = hooks_dir.join("pre-commit");

    if hook_path.exists() {
        let existing = fs::read_to_string(&hook_path)
            .with_context(|| format!("Failed to read {}", hook_path.display()))?;
        if existing.contains(HOOK_MARKER) {
            return Ok((hook_path, HookInstall::AlreadyInstalled));
        }
        let mut content = existing;
        if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&format!("\n# Alignment map check\n{} || exit $?\n", command));
        fs::write(&hook_path, content)
            .with_context(|| format!("Failed to update {}", hook_path.display()))?;
        return Ok((hook_path, HookInstall::Appended));
    }

    fs::create_dir_all(hooks_dir)
        .with_context(|| format!("Failed to create {}", hooks_dir.display()))?;
    let script = format!(
        "#!/bin/sh\n# Alignment map pre-commit hook\n# Installed by: alignment-map install-hook\n\n{}\n\nexit $?\n",
        command
    );
    fs::write(&hook_path, script)
        .with_context(|| format!("Failed to write {}", hook_path.display()))?;
    make_executable(&hook_path)?;
    Ok((hook_path, HookInstall::Created))
}

/// Install the hook into the repository holding the project
pub fn install_project_hook(ctx: &ProjectContext) -> Result<(PathBuf, HookInstall)> {
    let repo_root = git::repo_root(&ctx.root)?;
    let hooks_dir = git::hooks_dir(&ctx.root)?;
    install_hook(&hooks_dir, &hook_command(ctx, &repo_root))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
