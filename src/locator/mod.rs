//! Declaration locators
//!
//! A locator finds where a named declaration lives in source text. Blocks
//! whose declaration cannot be found are unverifiable, never wrong.

pub mod ast;
pub mod fallback;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::models::LineRange;

pub use ast::{SupportedLanguage, TreeSitterLocator};

/// Kind of a located declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Class,
    Function,
    AsyncFunction,
    Method,
    Struct,
    Enum,
    Trait,
    Interface,
    Impl,
    Module,
    Type,
    Constant,
    File,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Class => "class",
            Self::Function => "function",
            Self::AsyncFunction => "async function",
            Self::Method => "method",
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Trait => "trait",
            Self::Interface => "interface",
            Self::Impl => "impl",
            Self::Module => "module",
            Self::Type => "type",
            Self::Constant => "constant",
            Self::File => "file",
        };
        f.write_str(s)
    }
}

/// A declaration and, for containers, its direct members
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub lines: LineRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Declaration>,
}

impl Declaration {
    /// Block name in the `"<name> <kind>"` convention
    pub fn block_name(&self) -> String {
        format!("{} {}", self.name, self.kind)
    }
}

/// Finds declarations in source text
pub trait DeclarationLocator {
    /// Top-level declarations, each with its direct members
    ///
    /// `None` when the source cannot be analysed.
    fn outline(&self, source: &str) -> Option<Vec<Declaration>>;

    /// Line range of the declaration named `identifier`
    ///
    /// Top-level declarations are searched first, then members one level
    /// inside containers.
    fn find(&self, source: &str, identifier: &str) -> Option<LineRange> {
        let outline = self.outline(source)?;
        outline
            .iter()
            .filter(|d| d.kind != DeclarationKind::Impl)
            .find(|d| d.name == identifier)
            .or_else(|| {
                outline
                    .iter()
                    .flat_map(|d| d.members.iter())
                    .find(|m| m.name == identifier)
            })
            .map(|d| d.lines)
    }
}

/// The locator for a file, chosen by extension
pub fn locator_for_path(path: &Path) -> Option<Box<dyn DeclarationLocator>> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    let language = SupportedLanguage::from_extension(ext)?;
    Some(Box::new(TreeSitterLocator::new(language)))
}

const NAME_SUFFIXES: &[&str] = &[
    " async function",
    " async_function",
    " class",
    " function",
    " method",
    " struct",
    " enum",
    " trait",
    " interface",
];

/// Recover the bare identifier from a descriptive block name
///
/// `"parse_config function"` → `"parse_config"`
pub fn extract_target_name(block_name: &str) -> &str {
    let trimmed = block_name.trim();
    NAME_SUFFIXES
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .map(str::trim)
        .unwrap_or(trimmed)
}
