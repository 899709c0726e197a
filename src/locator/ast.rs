//! Tree-sitter declaration locator
//!
//! One locator per language. Walks top-level nodes and one level into
//! containers (classes, impls, traits, modules).

use serde::{Deserialize, Serialize};
use tree_sitter::{Language, Node, Parser, Tree};

use super::{Declaration, DeclarationKind, DeclarationLocator};
use crate::models::LineRange;

/// Supported programming languages for AST analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
}

impl SupportedLanguage {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    fn tree_sitter_language(&self) -> Language {
        match self {
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Tsx => "TSX",
            Self::Go => "Go",
        }
    }
}

/// Declaration locator backed by a tree-sitter grammar
pub struct TreeSitterLocator {
    language: SupportedLanguage,
}

impl TreeSitterLocator {
    pub fn new(language: SupportedLanguage) -> Self {
        Self { language }
    }

    pub fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Parse `source`; trees with syntax errors are rejected
    fn parse(&self, source: &str) -> Option<Tree> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.language.tree_sitter_language()) {
            log::warn!(
                "Failed to load {} grammar: {}",
                self.language.display_name(),
                e
            );
            return None;
        }

        let tree = parser.parse(source, None)?;
        if tree.root_node().has_error() {
            log::debug!(
                "{} source has syntax errors, skipping declaration lookup",
                self.language.display_name()
            );
            return None;
        }
        Some(tree)
    }

    fn extract_node(&self, node: &Node, source: &str, nested: bool, out: &mut Vec<Declaration>) {
        match self.language {
            SupportedLanguage::Python => self.extract_python_node(node, source, nested, out),
            SupportedLanguage::Rust => self.extract_rust_node(node, source, nested, out),
            SupportedLanguage::JavaScript
            | SupportedLanguage::TypeScript
            | SupportedLanguage::Tsx => self.extract_js_node(node, source, nested, out),
            SupportedLanguage::Go => self.extract_go_node(node, source, out),
        }
    }

    /// Members of a container body, one level deep
    fn members(&self, body: Option<Node>, source: &str) -> Vec<Declaration> {
        let mut members = Vec::new();
        if let Some(body) = body {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                self.extract_node(&child, source, true, &mut members);
            }
        }
        members
    }

    // =========================================================================
    // Python
    // =========================================================================

    fn extract_python_node(
        &self,
        node: &Node,
        source: &str,
        nested: bool,
        out: &mut Vec<Declaration>,
    ) {
        match node.kind() {
            "function_definition" => {
                let is_async = node.child(0).is_some_and(|c| c.kind() == "async");
                let kind = if is_async {
                    DeclarationKind::AsyncFunction
                } else if nested {
                    DeclarationKind::Method
                } else {
                    DeclarationKind::Function
                };
                push_named(out, node, source, kind, Vec::new());
            }
            "class_definition" => {
                let members = if nested {
                    Vec::new()
                } else {
                    self.members(node.child_by_field_name("body"), source)
                };
                push_named(out, node, source, DeclarationKind::Class, members);
            }
            // The decorated node's range starts at the `def`/`class` line
            "decorated_definition" => {
                if let Some(definition) = node.child_by_field_name("definition") {
                    self.extract_python_node(&definition, source, nested, out);
                }
            }
            _ => {}
        }
    }

    // =========================================================================
    // Rust
    // =========================================================================

    fn extract_rust_node(
        &self,
        node: &Node,
        source: &str,
        nested: bool,
        out: &mut Vec<Declaration>,
    ) {
        let kind = match node.kind() {
            "function_item" | "function_signature_item" if nested => DeclarationKind::Method,
            "function_item" => DeclarationKind::Function,
            "struct_item" | "union_item" => DeclarationKind::Struct,
            "enum_item" => DeclarationKind::Enum,
            "type_item" => DeclarationKind::Type,
            "const_item" | "static_item" => DeclarationKind::Constant,
            "trait_item" | "mod_item" if !nested => {
                let kind = if node.kind() == "trait_item" {
                    DeclarationKind::Trait
                } else {
                    DeclarationKind::Module
                };
                let members = self.members(node.child_by_field_name("body"), source);
                push_named(out, node, source, kind, members);
                return;
            }
            "trait_item" => DeclarationKind::Trait,
            "mod_item" => DeclarationKind::Module,
            "impl_item" if !nested => {
                // Named after the implementing type
                if let Some(ty) = node.child_by_field_name("type") {
                    let members = self.members(node.child_by_field_name("body"), source);
                    out.push(Declaration {
                        name: node_text(&ty, source),
                        kind: DeclarationKind::Impl,
                        lines: node_lines(node),
                        members,
                    });
                }
                return;
            }
            _ => return,
        };
        push_named(out, node, source, kind, Vec::new());
    }

    // =========================================================================
    // JavaScript / TypeScript
    // =========================================================================

    fn extract_js_node(
        &self,
        node: &Node,
        source: &str,
        nested: bool,
        out: &mut Vec<Declaration>,
    ) {
        match node.kind() {
            "export_statement" => {
                if let Some(declaration) = node.child_by_field_name("declaration") {
                    self.extract_js_node(&declaration, source, nested, out);
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                let kind = if node.child(0).is_some_and(|c| c.kind() == "async") {
                    DeclarationKind::AsyncFunction
                } else {
                    DeclarationKind::Function
                };
                push_named(out, node, source, kind, Vec::new());
            }
            "class_declaration" | "abstract_class_declaration" => {
                let members = if nested {
                    Vec::new()
                } else {
                    self.members(node.child_by_field_name("body"), source)
                };
                push_named(out, node, source, DeclarationKind::Class, members);
            }
            "method_definition" | "abstract_method_signature" if nested => {
                push_named(out, node, source, DeclarationKind::Method, Vec::new());
            }
            "interface_declaration" => {
                push_named(out, node, source, DeclarationKind::Interface, Vec::new());
            }
            "type_alias_declaration" => {
                push_named(out, node, source, DeclarationKind::Type, Vec::new());
            }
            "enum_declaration" => {
                push_named(out, node, source, DeclarationKind::Enum, Vec::new());
            }
            // `const handler = () => { ... }`
            "lexical_declaration" | "variable_declaration" if !nested => {
                let mut cursor = node.walk();
                for declarator in node.named_children(&mut cursor) {
                    let is_function = declarator.child_by_field_name("value").is_some_and(|v| {
                        matches!(
                            v.kind(),
                            "arrow_function" | "function_expression" | "function"
                        )
                    });
                    if let (true, Some(name)) =
                        (is_function, declarator.child_by_field_name("name"))
                    {
                        out.push(Declaration {
                            name: node_text(&name, source),
                            kind: DeclarationKind::Function,
                            lines: node_lines(node),
                            members: Vec::new(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    // =========================================================================
    // Go
    // =========================================================================

    fn extract_go_node(&self, node: &Node, source: &str, out: &mut Vec<Declaration>) {
        match node.kind() {
            "function_declaration" => {
                push_named(out, node, source, DeclarationKind::Function, Vec::new());
            }
            "method_declaration" => {
                push_named(out, node, source, DeclarationKind::Method, Vec::new());
            }
            "type_declaration" => {
                let mut cursor = node.walk();
                let specs: Vec<Node> = node
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() == "type_spec")
                    .collect();
                for spec in &specs {
                    let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
                        Some("struct_type") => DeclarationKind::Struct,
                        Some("interface_type") => DeclarationKind::Interface,
                        _ => DeclarationKind::Type,
                    };
                    // A lone spec owns the whole `type` declaration
                    let range_node = if specs.len() == 1 { node } else { spec };
                    if let Some(name) = spec.child_by_field_name("name") {
                        out.push(Declaration {
                            name: node_text(&name, source),
                            kind,
                            lines: node_lines(range_node),
                            members: Vec::new(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

impl DeclarationLocator for TreeSitterLocator {
    fn outline(&self, source: &str) -> Option<Vec<Declaration>> {
        let tree = self.parse(source)?;
        let root = tree.root_node();
        let mut declarations = Vec::new();
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            self.extract_node(&node, source, false, &mut declarations);
        }
        Some(declarations)
    }
}

fn push_named(
    out: &mut Vec<Declaration>,
    node: &Node,
    source: &str,
    kind: DeclarationKind,
    members: Vec<Declaration>,
) {
    if let Some(name) = node.child_by_field_name("name") {
        out.push(Declaration {
            name: node_text(&name, source),
            kind,
            lines: node_lines(node),
            members,
        });
    }
}

fn node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .unwrap_or_default()
        .to_string()
}

/// 1-indexed inclusive lines of a node
///
/// A node ending at column 0 stops at the previous line's newline.
fn node_lines(node: &Node) -> LineRange {
    let start = node.start_position().row + 1;
    let end_pos = node.end_position();
    let end = if end_pos.column == 0 && end_pos.row + 1 > start {
        end_pos.row
    } else {
        end_pos.row + 1
    };
    LineRange::spanning(start, end)
}
