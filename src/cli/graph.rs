//! `alignment-map graph`

use clap::Args;
use colored::Colorize;

use super::{print_json, Outcome};
use crate::context::ProjectContext;
use crate::services::AlignmentGraph;
use crate::Result;

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GraphFormat {
    /// Graphviz DOT
    Dot,
    #[default]
    Ascii,
    Json,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "ascii")]
    pub format: GraphFormat,
}

pub fn run(ctx: &ProjectContext, args: GraphArgs) -> Result<Outcome> {
    let store = ctx.load_map()?;
    let graph = AlignmentGraph::from_map(store.map());

    match args.format {
        GraphFormat::Json => print_json(&graph)?,
        GraphFormat::Dot => print!("{}", graph.to_dot()),
        GraphFormat::Ascii => println!("{}", render_tree(&graph)),
    }
    Ok(Outcome::Clean)
}

/// Tree of files, their blocks and what each block is aligned with
pub fn render_tree(graph: &AlignmentGraph) -> String {
    let stats = &graph.stats;
    let mut output = String::new();
    output.push_str(&format!("{}\n", "Alignment Map".bold()));

    output.push_str(&format!("├── {}\n", "Statistics".cyan()));
    output.push_str(&format!(
        "│   ├── Files: {} ({} code, {} docs)\n",
        stats.total_files, stats.code_files, stats.doc_files
    ));
    output.push_str(&format!("│   ├── Blocks: {}\n", stats.total_blocks));
    let last = if stats.human_required_docs > 0 { "├──" } else { "└──" };
    output.push_str(&format!("│   {} Alignments: {}\n", last, stats.total_alignments));
    if stats.human_required_docs > 0 {
        output.push_str(&format!(
            "│   └── {}\n",
            format!("Human-required docs: {}", stats.human_required_docs).red()
        ));
    }

    output.push_str(&format!("└── {}\n", "Files and Alignments".bold()));
    let files = graph.files();
    for (i, file) in files.iter().enumerate() {
        let file_last = i + 1 == files.len();
        let (branch, stem) = if file_last { ("└──", "    ") } else { ("├──", "│   ") };
        let label = if file.is_code {
            file.label.cyan()
        } else if file.is_doc && file.requires_human {
            file.label.red()
        } else if file.is_doc {
            file.label.green()
        } else {
            file.label.normal()
        };
        output.push_str(&format!("    {} {}\n", branch, label));

        let blocks = graph.blocks_of(&file.id);
        for (j, block) in blocks.iter().enumerate() {
            let block_last = j + 1 == blocks.len();
            let (branch, inner) = if block_last { ("└──", "    ") } else { ("├──", "│   ") };
            let lines = block.lines.map(|l| l.to_string()).unwrap_or_default();
            output.push_str(&format!(
                "    {}{} {} {}\n",
                stem,
                branch,
                block.label,
                format!("(lines {})", lines).dimmed()
            ));

            let edges = graph.edges_from(&block.id);
            for (k, edge) in edges.iter().enumerate() {
                let Some(target) = graph.node(&edge.target) else {
                    continue;
                };
                let branch = if k + 1 == edges.len() { "└──" } else { "├──" };
                let anchor = edge.anchor.as_deref().map(|a| format!("#{}", a)).unwrap_or_default();
                let aligned = format!("{}{}", target.label, anchor);
                let (arrow, aligned) = if edge.code {
                    ("↔", aligned.cyan())
                } else {
                    ("→", aligned.green())
                };
                output.push_str(&format!("    {}{}{} {} {}\n", stem, inner, branch, arrow, aligned));
            }
        }
    }

    output.push('\n');
    output.push_str("Legend: → alignment to documentation, ↔ code-to-code alignment");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlignmentMap, Block, FileMapping, LineRange};

    fn graph() -> AlignmentGraph {
        let mut map = AlignmentMap::new();
        let mut mapping = FileMapping::new("src/app.py");
        mapping
            .add_block(Block::new("App class", LineRange::new(1, 20).unwrap()).with_aligned(vec![
                "docs/design.md#overview".into(),
                "src/util.py:parse".into(),
            ]))
            .unwrap();
        map.add_mapping(mapping).unwrap();
        AlignmentGraph::from_map(&map)
    }

    #[test]
    fn test_tree_lists_files_blocks_and_alignments() {
        let tree = render_tree(&graph());
        assert!(tree.contains("Files: 3 (2 code, 1 docs)"));
        assert!(tree.contains("Alignments: 2"));
        assert!(tree.contains("App class"));
        assert!(tree.contains("(lines 1-20)"));
        assert!(tree.contains("docs/design.md#overview"));
        assert!(tree.contains("src/util.py#parse"));
        assert!(!tree.contains("Human-required"));
    }

    #[test]
    fn test_tree_of_empty_map() {
        let tree = render_tree(&AlignmentGraph::from_map(&AlignmentMap::new()));
        assert!(tree.contains("Files: 0 (0 code, 0 docs)"));
    }
}
