//! `alignment-map check`

use std::collections::BTreeMap;

use clap::Args;
use colored::Colorize;

use super::{indent, print_json, Outcome};
use crate::context::ProjectContext;
use crate::models::{CheckFailure, CheckResult};
use crate::services::check_project;
use crate::Result;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Check unstaged work-tree changes instead of the index
    #[arg(long)]
    pub unstaged: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &ProjectContext, args: CheckArgs) -> Result<Outcome> {
    let outcome = check_project(ctx, args.unstaged)?;

    if args.json {
        print_json(&outcome)?;
        return Ok(Outcome::from_clean(outcome.passed()));
    }

    if outcome.passed() {
        println!();
        println!("{}", "✓ Alignment check passed".green().bold());
        println!();
        return Ok(Outcome::Clean);
    }

    println!();
    println!("{}", "ALIGNMENT CHECK FAILED".red().bold());
    println!();

    let mut by_result: BTreeMap<u8, (CheckResult, Vec<&CheckFailure>)> = BTreeMap::new();
    for failure in &outcome.failures {
        by_result
            .entry(order(failure.result))
            .or_insert_with(|| (failure.result, Vec::new()))
            .1
            .push(failure);
    }

    for (result, failures) in by_result.values() {
        println!("{}", format!("✗ {}", heading(*result)).yellow().bold());
        println!();
        for failure in failures {
            print_failure(failure);
        }
    }

    println!(
        "{}",
        format!("Total failures: {}", outcome.failures.len()).red().bold()
    );
    println!();
    Ok(Outcome::Failures)
}

fn order(result: CheckResult) -> u8 {
    match result {
        CheckResult::UnmappedFile => 0,
        CheckResult::UnmappedLines => 1,
        CheckResult::MapNotUpdated => 2,
        CheckResult::StaleDoc => 3,
        CheckResult::HumanEscalation => 4,
    }
}

fn heading(result: CheckResult) -> &'static str {
    match result {
        CheckResult::UnmappedFile => "Unmapped files",
        CheckResult::UnmappedLines => "Unmapped lines",
        CheckResult::MapNotUpdated => "Alignment map not updated",
        CheckResult::StaleDoc => "Stale documents require review",
        CheckResult::HumanEscalation => "Human review required",
    }
}

fn print_failure(failure: &CheckFailure) {
    println!("  {}", failure.file.display().to_string().cyan());
    println!("    {}", failure.message);
    if let (Some(block), Some(lines)) = (&failure.block, &failure.block_lines) {
        println!("    Block: \"{}\" (lines {})", block, lines);
    }
    if let Some(doc) = &failure.aligned_doc {
        println!("    Aligned document: {}", doc.yellow());
    }
    if let Some(section) = &failure.doc_section {
        println!();
        println!("{}", indent(section, "      │ ").dimmed());
    }
    if let Some(suggestion) = &failure.suggestion {
        println!("    {} {}", "→".bright_black(), suggestion);
    }
    println!();
}
