//! `alignment-map touch`

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use super::{print_json, Outcome};
use crate::context::ProjectContext;
use crate::services::touch_block;
use crate::Result;

#[derive(Args, Debug)]
pub struct TouchArgs {
    /// Source file, relative to the project root
    pub file: PathBuf,

    /// Block name
    #[arg(long)]
    pub block: String,

    /// What changed in the block
    #[arg(long)]
    pub comment: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &ProjectContext, args: TouchArgs) -> Result<Outcome> {
    let file = ctx.project_path(&args.file);
    let outcome = touch_block(ctx, &file, &args.block, &args.comment)?;

    if args.json {
        print_json(&outcome)?;
        return Ok(Outcome::Clean);
    }

    println!("{} Touched '{}'", "✓".green(), outcome.block.cyan());
    if outcome.moved() {
        println!("  Lines: {} → {}", outcome.old_lines, outcome.new_lines.to_string().yellow());
    } else {
        println!("  Lines: {}", outcome.new_lines);
    }
    if !outcome.verified {
        println!(
            "  {}",
            "Declaration not found in source, line range kept as recorded".yellow()
        );
    }
    if !outcome.aligned_with.is_empty() {
        println!();
        println!("Review these documents and bump their last_reviewed:");
        for doc in &outcome.aligned_with {
            println!("  - {}", doc);
        }
    }
    Ok(Outcome::Clean)
}
