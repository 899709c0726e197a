use std::io;
use std::path::PathBuf;

use alignment_map::cli::{self, Outcome, EXIT_ERROR};
use alignment_map::{ProjectContext, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;

#[derive(Parser)]
#[command(name = "alignment-map")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keep code and documentation aligned", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the alignment map file
    #[arg(short, long, global = true, env = "ALIGNMENT_MAP")]
    mapfile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check staged changes against the alignment map
    Check(cli::check::CheckArgs),

    /// Validate the alignment map and write a fix ledger
    Lint(cli::lint::LintArgs),

    /// Add or update a block in the alignment map
    Update(cli::update::UpdateArgs),

    /// Restamp a block after changing its code
    Touch(cli::touch::TouchArgs),

    /// Suggest block boundaries for unmapped code
    Suggest(cli::suggest::SuggestArgs),

    /// Print all context needed to review a file or line
    Trace(cli::trace::TraceArgs),

    /// Pre-flight check showing which docs would need review
    Review(cli::review::ReviewArgs),

    /// Visualize alignment relationships
    Graph(cli::graph::GraphArgs),

    /// Install the pre-commit git hook
    #[command(name = "install-hook")]
    InstallHook,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            std::process::exit(EXIT_ERROR);
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    if let Commands::Completions { shell } = cli.command {
        generate(shell, &mut Cli::command(), "alignment-map", &mut io::stdout());
        return Ok(Outcome::Clean);
    }

    let ctx = ProjectContext::discover(cli.mapfile.as_deref())?;
    log::debug!("Using alignment map {}", ctx.map_path.display());

    match cli.command {
        Commands::Check(args) => cli::check::run(&ctx, args),
        Commands::Lint(args) => cli::lint::run(&ctx, args),
        Commands::Update(args) => cli::update::run(&ctx, args),
        Commands::Touch(args) => cli::touch::run(&ctx, args),
        Commands::Suggest(args) => cli::suggest::run(&ctx, args),
        Commands::Trace(args) => cli::trace::run(&ctx, args),
        Commands::Review(args) => cli::review::run(&ctx, args),
        Commands::Graph(args) => cli::graph::run(&ctx, args),
        Commands::InstallHook => cli::hook::run(&ctx),
        Commands::Completions { .. } => Ok(Outcome::Clean),
    }
}
