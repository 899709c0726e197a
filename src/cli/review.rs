//! `alignment-map review`

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use super::{print_json, Outcome};
use crate::context::ProjectContext;
use crate::services::{review, Impact, ReferenceStatus};
use crate::Result;

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// File about to be edited
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &ProjectContext, args: ReviewArgs) -> Result<Outcome> {
    let file = ctx.project_path(&args.file);
    let store = ctx.load_map()?;
    let map = store.map();
    let docs = ctx.documents(map.settings.fuzzy_match);
    let report = review(map, &docs, &file)?;

    if args.json {
        print_json(&report)?;
        return Ok(Outcome::Clean);
    }

    println!("{}", format!("Pre-flight review: {}", file.display()).cyan().bold());
    for block in &report.blocks {
        println!();
        println!("{} (lines {})", block.name.bold(), block.lines);
        for doc in &block.references {
            let status = match doc.status {
                ReferenceStatus::Current => "current".green(),
                ReferenceStatus::Stale => "needs review".yellow(),
                ReferenceStatus::NeverReviewed => "no review timestamp".yellow(),
                ReferenceStatus::Missing => "missing".red(),
                ReferenceStatus::CodeReference => "code".blue(),
            };
            let human = if doc.requires_human { " [human]".red() } else { "".normal() };
            println!("  - {} [{}]{}", doc.reference, status, human);
        }
    }

    let req = &report.requirements;
    println!();
    println!("{}", "Review requirements".bold());
    println!("  Documents:        {}", req.total_docs);
    println!("  Human required:   {}", req.requires_human);
    println!("  Need update:      {}", req.requires_update);
    println!("  Already current:  {}", req.already_current);

    let impact = match report.impact {
        Impact::Minimal => "minimal".green(),
        Impact::Low => "low".green(),
        Impact::Medium => "medium".yellow(),
        Impact::High => "high".red(),
    };
    println!();
    println!("Estimated impact: {} ({})", impact.bold(), report.impact.description());
    Ok(Outcome::Clean)
}
