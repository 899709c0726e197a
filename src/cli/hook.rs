//! `alignment-map install-hook`

use colored::Colorize;

use super::Outcome;
use crate::context::ProjectContext;
use crate::services::{install_project_hook, HookInstall};
use crate::Result;

pub fn run(ctx: &ProjectContext) -> Result<Outcome> {
    let (path, result) = install_project_hook(ctx)?;
    match result {
        HookInstall::Created => {
            println!("{} Installed pre-commit hook at {}", "✓".green(), path.display())
        }
        HookInstall::Appended => {
            eprintln!(
                "{}",
                format!("Existing pre-commit hook found at {}", path.display()).yellow()
            );
            println!("{} Appended alignment-map check", "✓".green());
        }
        HookInstall::AlreadyInstalled => println!("Alignment map hook already installed"),
    }
    Ok(Outcome::Clean)
}
