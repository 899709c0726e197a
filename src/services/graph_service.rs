//! Graph service - code and documentation relationships of the whole map
//!
//! Mapped files and their blocks become nodes. Every `aligned_with` entry is
//! an edge from its block to the referenced file; referenced files without a
//! mapping of their own get a node as well.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{normalize_path, timestamp, AlignmentMap, LineRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Owning file node of a block
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<LineRange>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::optional::serialize"
    )]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::optional::serialize"
    )]
    pub last_reviewed: Option<NaiveDateTime>,
    pub is_code: bool,
    pub is_doc: bool,
    pub requires_human: bool,
}

impl GraphNode {
    fn file(id: String, path: &str, is_code: bool, map: &AlignmentMap) -> Self {
        let is_doc = is_doc_path(path);
        Self {
            id,
            label: path.to_string(),
            kind: NodeKind::File,
            parent: None,
            lines: None,
            last_updated: None,
            last_reviewed: None,
            is_code: is_code && !is_doc,
            is_doc,
            requires_human: map.hierarchy.is_human_required(path),
        }
    }
}

/// `aligned_with` edge from a block to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    /// Code-to-code alignment
    pub code: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GraphStats {
    pub total_files: usize,
    pub total_blocks: usize,
    pub total_alignments: usize,
    pub code_files: usize,
    pub doc_files: usize,
    pub human_required_docs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub stats: GraphStats,
}

fn is_doc_path(path: &str) -> bool {
    path.ends_with(".md") || path.ends_with(".markdown")
}

impl AlignmentGraph {
    /// Build the graph of `map`
    ///
    /// Node ids are `file_N` and `block_N` from one counter, in map order.
    pub fn from_map(map: &AlignmentMap) -> Self {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut file_ids: HashMap<PathBuf, String> = HashMap::new();
        let mut next_id = 0usize;

        // Mapped files first, so references to them land on the same node
        let mut block_ids = Vec::new();
        for mapping in &map.mappings {
            let file_id = format!("file_{}", next_id);
            next_id += 1;
            let path = mapping.file.to_string_lossy();
            nodes.push(GraphNode::file(file_id.clone(), &path, true, map));
            file_ids.insert(normalize_path(&mapping.file), file_id.clone());

            for block in &mapping.blocks {
                let block_id = format!("block_{}", next_id);
                next_id += 1;
                nodes.push(GraphNode {
                    id: block_id.clone(),
                    label: block.name.clone(),
                    kind: NodeKind::Block,
                    parent: Some(file_id.clone()),
                    lines: Some(block.lines),
                    last_updated: block.last_updated,
                    last_reviewed: block.last_reviewed,
                    is_code: false,
                    is_doc: false,
                    requires_human: false,
                });
                block_ids.push((block_id, block));
            }
        }

        for (block_id, block) in block_ids {
            for raw in &block.aligned_with {
                let reference = map.parse_reference(raw);
                let key = normalize_path(Path::new(&reference.path));
                let target = match file_ids.get(&key) {
                    Some(id) => id.clone(),
                    None => {
                        let id = format!("file_{}", next_id);
                        next_id += 1;
                        nodes.push(GraphNode::file(id.clone(), &reference.path, reference.is_code, map));
                        file_ids.insert(key, id.clone());
                        id
                    }
                };
                edges.push(GraphEdge {
                    source: block_id.clone(),
                    target,
                    anchor: reference.anchor,
                    code: reference.is_code,
                });
            }
        }

        let files = || nodes.iter().filter(|n| n.kind == NodeKind::File);
        let stats = GraphStats {
            total_files: files().count(),
            total_blocks: nodes.iter().filter(|n| n.kind == NodeKind::Block).count(),
            total_alignments: edges.len(),
            code_files: files().filter(|n| n.is_code).count(),
            doc_files: files().filter(|n| n.is_doc).count(),
            human_required_docs: files().filter(|n| n.is_doc && n.requires_human).count(),
        };

        Self { nodes, edges, stats }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// File nodes, code files first, then by label
    pub fn files(&self) -> Vec<&GraphNode> {
        let mut files: Vec<_> = self.nodes.iter().filter(|n| n.kind == NodeKind::File).collect();
        files.sort_by(|a, b| (!a.is_code, &a.label).cmp(&(!b.is_code, &b.label)));
        files
    }

    pub fn blocks_of(&self, file_id: &str) -> Vec<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| n.parent.as_deref() == Some(file_id))
            .collect()
    }

    pub fn edges_from(&self, block_id: &str) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.source == block_id).collect()
    }

    /// Graphviz DOT, code and documentation files clustered
    pub fn to_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph AlignmentMap {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box];\n\n");

        let files: Vec<_> = self.nodes.iter().filter(|n| n.kind == NodeKind::File).collect();

        let code: Vec<_> = files.iter().filter(|n| n.is_code).collect();
        if !code.is_empty() {
            output.push_str("  subgraph cluster_code {\n");
            output.push_str("    label=\"Code Files\";\n");
            output.push_str("    style=filled;\n");
            output.push_str("    color=lightblue;\n");
            for node in code {
                output.push_str(&format!(
                    "    {} [label=\"{}\", shape=box, style=filled, fillcolor=white];\n",
                    node.id,
                    escape(&node.label)
                ));
            }
            output.push_str("  }\n\n");
        }

        let docs: Vec<_> = files.iter().filter(|n| n.is_doc).collect();
        if !docs.is_empty() {
            output.push_str("  subgraph cluster_docs {\n");
            output.push_str("    label=\"Documentation\";\n");
            output.push_str("    style=filled;\n");
            output.push_str("    color=lightgreen;\n");
            for node in docs {
                let fill = if node.requires_human { "pink" } else { "white" };
                output.push_str(&format!(
                    "    {} [label=\"{}\", shape=note, style=filled, fillcolor={}];\n",
                    node.id,
                    escape(&node.label),
                    fill
                ));
            }
            output.push_str("  }\n\n");
        }

        for node in files.iter().filter(|n| !n.is_code && !n.is_doc) {
            output.push_str(&format!("  {} [label=\"{}\"];\n", node.id, escape(&node.label)));
        }

        for node in self.nodes.iter().filter(|n| n.kind == NodeKind::Block) {
            let lines = node.lines.map(|l| l.to_string()).unwrap_or_default();
            output.push_str(&format!(
                "  {} [label=\"{}\\n{}\", shape=ellipse, style=filled, fillcolor=lightyellow];\n",
                node.id,
                escape(&node.label),
                lines
            ));
            if let Some(parent) = &node.parent {
                output.push_str(&format!(
                    "  {} -> {} [style=dotted, arrowhead=none];\n",
                    parent, node.id
                ));
            }
        }
        output.push('\n');

        for edge in &self.edges {
            match &edge.anchor {
                Some(anchor) => output.push_str(&format!(
                    "  {} -> {} [label=\"#{}\"];\n",
                    edge.source,
                    edge.target,
                    escape(anchor)
                )),
                None => output.push_str(&format!("  {} -> {};\n", edge.source, edge.target)),
            }
        }

        output.push_str("}\n");
        output
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
