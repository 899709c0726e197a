//! `alignment-map lint`

use clap::Args;
use colored::Colorize;

use super::{print_json, Outcome};
use crate::context::ProjectContext;
use crate::models::{Confidence, FixEntry};
use crate::services::{apply_project_fixes, lint_project};
use crate::Result;

#[derive(Args, Debug)]
pub struct LintArgs {
    /// Apply the automatic fixes from the ledger (running lint first if needed)
    #[arg(long)]
    pub apply: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &ProjectContext, args: LintArgs) -> Result<Outcome> {
    if args.apply {
        return run_apply(ctx, args.json);
    }

    let outcome = lint_project(ctx)?;
    if args.json {
        print_json(&outcome.ledger)?;
        return Ok(Outcome::from_clean(outcome.is_clean()));
    }

    if outcome.is_clean() {
        println!("{}", "✓ Alignment map is valid".green().bold());
        if outcome.removed_stale {
            println!("  Removed stale {}", outcome.ledger_path.display());
        }
        return Ok(Outcome::Clean);
    }

    let ledger = &outcome.ledger;
    println!(
        "{}",
        format!("Found {} issue(s) in the alignment map", ledger.fixes.len())
            .yellow()
            .bold()
    );
    println!();
    for entry in &ledger.fixes {
        print_entry(entry);
    }
    println!(
        "  {} auto, {} manual",
        ledger.auto_count().to_string().green(),
        ledger.manual_count().to_string().red()
    );
    println!("  Ledger written to {}", outcome.ledger_path.display());
    if ledger.auto_count() > 0 {
        println!(
            "  Run {} to apply the automatic fixes",
            "alignment-map lint --apply".cyan()
        );
    }
    Ok(Outcome::Failures)
}

fn run_apply(ctx: &ProjectContext, json: bool) -> Result<Outcome> {
    let outcome = apply_project_fixes(ctx)?;
    let clean = outcome.remaining == 0;

    if json {
        let failed: Vec<serde_json::Value> = outcome
            .report
            .failed
            .iter()
            .map(|(entry, reason)| serde_json::json!({ "fix": entry, "error": reason }))
            .collect();
        print_json(&serde_json::json!({
            "generated": outcome.generated,
            "applied": outcome.report.applied,
            "skipped": outcome.report.skipped,
            "failed": failed,
        }))?;
        return Ok(Outcome::from_clean(clean));
    }

    if outcome.generated {
        println!("{}", "No fix ledger found, ran lint first".dimmed());
    }
    for action in &outcome.report.applied {
        println!("  {} {}", "✓".green(), action);
    }
    for (entry, reason) in &outcome.report.failed {
        println!(
            "  {} {}: {} ({})",
            "✗".red(),
            entry.file.display(),
            entry.description,
            reason
        );
    }
    if !outcome.report.skipped.is_empty() {
        println!();
        println!("{}", "Manual fixes required:".yellow().bold());
        for entry in &outcome.report.skipped {
            print_entry(entry);
        }
    }

    if clean {
        println!(
            "{}",
            format!("✓ Applied {} fix(es)", outcome.report.applied.len())
                .green()
                .bold()
        );
    } else {
        println!(
            "{} left in {}",
            format!("{} fix(es)", outcome.remaining).red().bold(),
            outcome.ledger_path.display()
        );
    }
    Ok(Outcome::from_clean(clean))
}

fn print_entry(entry: &FixEntry) {
    let action = if entry.is_auto() {
        "auto".green()
    } else {
        "manual".red()
    };
    let confidence = match entry.confidence {
        Confidence::High => entry.confidence.to_string().normal(),
        Confidence::Medium => entry.confidence.to_string().yellow(),
        Confidence::Low => entry.confidence.to_string().red(),
    };
    println!(
        "  [{}] {} {}",
        action,
        entry.issue.to_string().bold(),
        entry.file.display().to_string().cyan()
    );
    println!("    {} (confidence: {})", entry.description, confidence);
    if let Some(reason) = &entry.reason {
        println!("    {}", reason.dimmed());
    }
    println!();
}
