//! Lint service - maintain the fix ledger next to the map
//!
//! `lint` writes `.alignment-map.fixes` when issues exist and removes a
//! stale one when the map is clean. `apply` consumes the ledger (running
//! lint first when there is none) and leaves behind only what still needs
//! a human.

use std::path::PathBuf;

use crate::context::ProjectContext;
use crate::models::{FixEntry, FixLedger, IssueKind};
use crate::store::{read_ledger, remove_ledger, write_ledger};
use crate::validator::{apply_fixes, lint_map_file, ApplyReport};
use crate::Result;

#[derive(Debug)]
pub struct LintOutcome {
    pub ledger: FixLedger,
    pub ledger_path: PathBuf,
    /// A ledger from an earlier run was deleted because the map is clean
    pub removed_stale: bool,
}

impl LintOutcome {
    pub fn is_clean(&self) -> bool {
        self.ledger.is_empty()
    }
}

#[derive(Debug)]
pub struct ApplyOutcome {
    /// No ledger existed, so lint ran first
    pub generated: bool,
    pub report: ApplyReport,
    pub ledger_path: PathBuf,
    /// Entries written back to the ledger for manual resolution
    pub remaining: usize,
}

pub fn lint_project(ctx: &ProjectContext) -> Result<LintOutcome> {
    if !ctx.map_path.exists() {
        anyhow::bail!("Alignment map not found: {}", ctx.map_path.display());
    }
    let ledger = FixLedger::new(lint_map_file(&ctx.map_path)?);
    let ledger_path = ctx.ledger_path();

    let removed_stale = if ledger.is_empty() {
        remove_ledger(&ledger_path)?
    } else {
        write_ledger(&ledger_path, &ledger)?;
        log::debug!("Wrote {} fix(es) to {}", ledger.fixes.len(), ledger_path.display());
        false
    };

    Ok(LintOutcome {
        ledger,
        ledger_path,
        removed_stale,
    })
}

pub fn apply_project_fixes(ctx: &ProjectContext) -> Result<ApplyOutcome> {
    let ledger_path = ctx.ledger_path();
    let generated = !ledger_path.exists();
    let ledger = if generated {
        lint_project(ctx)?.ledger
    } else {
        read_ledger(&ledger_path)?
    };

    // An unparseable map cannot be loaded, let alone fixed
    if ledger.fixes.iter().any(|f| f.issue == IssueKind::ParseError) {
        let report = ApplyReport {
            skipped: ledger.fixes.clone(),
            ..ApplyReport::default()
        };
        return Ok(ApplyOutcome {
            generated,
            remaining: report.skipped.len(),
            report,
            ledger_path,
        });
    }

    let mut store = ctx.load_map()?;
    let report = apply_fixes(store.map_mut(), &ledger);
    if !report.applied.is_empty() {
        store.save()?;
    }

    let remaining: Vec<FixEntry> = report
        .skipped
        .iter()
        .cloned()
        .chain(report.failed.iter().map(|(entry, _)| entry.clone()))
        .collect();
    let remaining_count = remaining.len();
    if remaining.is_empty() {
        remove_ledger(&ledger_path)?;
    } else {
        write_ledger(&ledger_path, &FixLedger::new(remaining))?;
    }

    Ok(ApplyOutcome {
        generated,
        report,
        ledger_path,
        remaining: remaining_count,
    })
}
