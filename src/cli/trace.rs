//! `alignment-map trace`

use clap::Args;
use colored::{ColoredString, Colorize};

use super::{indent, print_json, Outcome};
use crate::context::ProjectContext;
use crate::services::{parse_location, trace, ReferenceStatus, TracedReference};
use crate::Result;

#[derive(Args, Debug)]
pub struct TraceArgs {
    /// FILE or FILE:LINE
    pub location: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(ctx: &ProjectContext, args: TraceArgs) -> Result<Outcome> {
    let (file, line) = parse_location(&args.location);
    let file = ctx.project_path(&file);
    let store = ctx.load_map()?;
    let map = store.map();
    let docs = ctx.documents(map.settings.fuzzy_match);

    // Unmapped files and lines are findings, not errors
    let report = match trace(map, &docs, &file, line) {
        Ok(report) => report,
        Err(e) if args.json => {
            print_json(&serde_json::json!({
                "error": format!("{:#}", e),
                "file": file,
                "line": line,
            }))?;
            return Ok(Outcome::Failures);
        }
        Err(e) => {
            eprintln!("{}", format!("{:#}", e).yellow());
            return Ok(Outcome::Failures);
        }
    };

    if args.json {
        print_json(&report)?;
        return Ok(Outcome::from_clean(report.stale().next().is_none()));
    }

    let location = match line {
        Some(line) => format!("{}:{}", file.display(), line),
        None => file.display().to_string(),
    };
    println!("{}", format!("Trace: {}", location).cyan().bold());

    for block in &report.blocks {
        println!();
        println!("{} (lines {})", block.name.bold(), block.lines);
        if let Some(updated) = block.last_updated {
            println!("  Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S"));
        }
        if let Some(comment) = &block.last_update_comment {
            println!("  Comment:      {}", comment);
        }
        if block.references.is_empty() {
            println!("  {}", "No aligned documents".dimmed());
        }
        for reference in &block.references {
            print_reference(reference);
        }
    }

    let stale: Vec<_> = report.stale().collect();
    if !stale.is_empty() {
        println!();
        println!("{}", "Staleness".yellow().bold());
        for (block, reference) in stale {
            let who = if reference.requires_human {
                "human review".red()
            } else {
                "review".yellow()
            };
            println!("  '{}' → {} needs {}", block.name, reference.reference, who);
        }
    }
    Ok(Outcome::Clean)
}

fn status_label(status: ReferenceStatus) -> ColoredString {
    match status {
        ReferenceStatus::Current => "current".green(),
        ReferenceStatus::Stale => "stale".yellow(),
        ReferenceStatus::NeverReviewed => "never reviewed".yellow(),
        ReferenceStatus::Missing => "missing".red(),
        ReferenceStatus::CodeReference => "code".blue(),
    }
}

fn print_reference(reference: &TracedReference) {
    let human = if reference.requires_human {
        format!(" {}", "[human]".red())
    } else {
        String::new()
    };
    println!(
        "  → {} [{}]{}",
        reference.reference.cyan(),
        status_label(reference.status),
        human
    );
    if let Some(reviewed) = reference.last_reviewed {
        println!("    Last reviewed: {}", reviewed.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(section) = &reference.section {
        println!("{}", indent(section, "    │ ").dimmed());
    }
}
