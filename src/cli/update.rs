//! `alignment-map update`

use std::path::PathBuf;

use clap::{ArgGroup, Args};
use colored::Colorize;

use super::{print_json, Outcome};
use crate::context::ProjectContext;
use crate::models::LineRange;
use crate::services::{update_block, OverlapStrategy, UpdateChange, UpdateOutcome, UpdateRequest};
use crate::Result;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("strategy").args(["extend", "split", "replace"])))]
pub struct UpdateArgs {
    /// Source file, relative to the project root
    pub file: PathBuf,

    /// Block name
    #[arg(long)]
    pub block: String,

    /// Line range (e.g., 1-50)
    #[arg(long)]
    pub lines: LineRange,

    /// Aligned documents (repeatable)
    #[arg(long = "aligned-with", required = true, num_args = 1..)]
    pub aligned_with: Vec<String>,

    /// Description of the change
    #[arg(long)]
    pub comment: Option<String>,

    /// Grow the overlapped block to cover the new lines
    #[arg(long)]
    pub extend: bool,

    /// Carve the new block out of the overlapped one
    #[arg(long)]
    pub split: bool,

    /// Replace the overlapped blocks
    #[arg(long)]
    pub replace: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl UpdateArgs {
    fn strategy(&self) -> Option<OverlapStrategy> {
        if self.extend {
            Some(OverlapStrategy::Extend)
        } else if self.split {
            Some(OverlapStrategy::Split)
        } else if self.replace {
            Some(OverlapStrategy::Replace)
        } else {
            None
        }
    }
}

pub fn run(ctx: &ProjectContext, args: UpdateArgs) -> Result<Outcome> {
    let strategy = args.strategy();
    let request = UpdateRequest {
        file: ctx.project_path(&args.file),
        name: args.block.clone(),
        lines: args.lines,
        aligned_with: args.aligned_with.clone(),
        comment: args.comment.clone(),
    };

    let created = !ctx.map_path.exists();
    let outcome = update_block(ctx, &request, strategy)?;

    if args.json {
        print_json(&outcome)?;
        return Ok(Outcome::from_clean(outcome.is_applied()));
    }

    match &outcome {
        UpdateOutcome::Applied(applied) => {
            if created {
                println!("Created new alignment map");
            }
            let summary = match &applied.change {
                UpdateChange::CreatedMapping => {
                    format!("Created mapping for {}", request.file.display())
                }
                UpdateChange::Added => format!("Added block '{}'", applied.block),
                UpdateChange::Updated { previous } => {
                    format!("Updated block '{}' (was {})", applied.block, previous)
                }
                UpdateChange::Extended { from } => {
                    format!("Extended block '{}' from {}", applied.block, from)
                }
                UpdateChange::Split { parts } => {
                    format!("Split into {}", parts.join(", "))
                }
                UpdateChange::Replaced { replaced } => {
                    format!("Replaced {}", replaced.join(", "))
                }
            };
            println!("{} {}", "✓".green(), summary);
            println!("  Block: {}", applied.block.cyan());
            println!("  Lines: {}", applied.lines);
            println!("  Aligned with:");
            for doc in &applied.aligned_with {
                println!("    - {}", doc);
            }
            Ok(Outcome::Clean)
        }
        UpdateOutcome::Conflict(conflict) => {
            println!("{}", "⚠ Block overlap detected!".yellow().bold());
            println!();
            println!("Requested: {} lines {}", args.block.cyan(), conflict.requested);
            println!("Overlaps with:");
            for block in &conflict.overlapping {
                println!("  - '{}' (lines {})", block.name, block.lines);
                if !block.aligned_with.is_empty() {
                    println!("    Aligned with: {}", block.aligned_with.join(", "));
                }
            }
            println!();
            println!(
                "{} {}",
                "Suggested strategy:".bold(),
                conflict.suggested.to_string().green()
            );
            println!("{}", conflict.explanation().dimmed());
            println!();
            println!("To proceed, re-run with --{}:", conflict.suggested);
            let aligned: Vec<String> = args
                .aligned_with
                .iter()
                .map(|doc| format!("--aligned-with {}", doc))
                .collect();
            println!(
                "  alignment-map update {} --block \"{}\" --lines {} {} --{}",
                request.file.display(),
                args.block,
                args.lines,
                aligned.join(" "),
                conflict.suggested
            );
            Ok(Outcome::Failures)
        }
    }
}
