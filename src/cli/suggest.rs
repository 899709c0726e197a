//! `alignment-map suggest`

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use super::{print_json, Outcome};
use crate::context::ProjectContext;
use crate::models::Confidence;
use crate::services::suggest;
use crate::Result;

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Only suggest for this file
    pub file: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &ProjectContext, args: SuggestArgs) -> Result<Outcome> {
    let store = ctx.load_map()?;
    let file = args.file.as_deref().map(|f| ctx.project_path(f));
    let results = suggest(store.map(), file.as_deref())?;

    if args.json {
        print_json(&results)?;
        return Ok(Outcome::Clean);
    }

    if results.is_empty() {
        println!("{}", "✓ No unmapped code found".green().bold());
        return Ok(Outcome::Clean);
    }

    for file in &results {
        println!();
        println!(
            "{}",
            format!("Unmapped code in {}:", file.file.display()).cyan().bold()
        );
        println!();
        println!("  {:<10} {:<15} {:<40} {}", "Lines", "Type", "Name", "Confidence");
        for s in &file.suggestions {
            let confidence = match s.confidence {
                Confidence::High => s.confidence.to_string().green(),
                Confidence::Medium => s.confidence.to_string().yellow(),
                Confidence::Low => s.confidence.to_string().red(),
            };
            println!(
                "  {} {:<15} {:<40} {}",
                format!("{:<10}", s.lines.to_string()).yellow(),
                s.kind.to_string(),
                s.name,
                confidence
            );
        }

        println!();
        println!("{}", "To add these blocks, run:".bold());
        for s in &file.suggestions {
            println!(
                "{}",
                format!(
                    "  alignment-map update {} --block \"{}\" --lines {} --aligned-with <DOC>",
                    file.file.display(),
                    s.name,
                    s.lines
                )
                .dimmed()
            );
        }
    }

    println!();
    println!(
        "{}",
        "Never guess document alignments. Always pass --aligned-with explicitly.".yellow()
    );
    Ok(Outcome::Clean)
}
