//! Pattern-based declaration outline
//!
//! Used when no grammar is available or the source does not parse. Only
//! unindented lines are considered; a declaration runs until the next
//! match, with trailing blank lines trimmed.

use regex::Regex;

use super::{Declaration, DeclarationKind};
use crate::models::LineRange;

fn patterns_for_extension(ext: &str) -> &'static [(&'static str, DeclarationKind)] {
    match ext {
        "py" | "pyi" => &[
            (r"^class\s+(\w+)", DeclarationKind::Class),
            (r"^async\s+def\s+(\w+)", DeclarationKind::AsyncFunction),
            (r"^def\s+(\w+)", DeclarationKind::Function),
        ],
        "js" | "jsx" | "mjs" | "cjs" => &[
            (r"^(?:export\s+)?class\s+(\w+)", DeclarationKind::Class),
            (r"^(?:export\s+)?(?:async\s+)?function\s+(\w+)", DeclarationKind::Function),
            (r"^(?:export\s+)?const\s+(\w+)\s*=\s*(?:async\s*)?\(", DeclarationKind::Function),
        ],
        "ts" | "tsx" | "mts" | "cts" => &[
            (r"^(?:export\s+)?(?:abstract\s+)?class\s+(\w+)", DeclarationKind::Class),
            (r"^(?:export\s+)?interface\s+(\w+)", DeclarationKind::Interface),
            (r"^(?:export\s+)?(?:async\s+)?function\s+(\w+)", DeclarationKind::Function),
            (r"^(?:export\s+)?const\s+(\w+)\s*=\s*(?:async\s*)?\(", DeclarationKind::Function),
        ],
        "java" | "kt" => &[
            (r"^(?:public\s+)?(?:abstract\s+|final\s+)*class\s+(\w+)", DeclarationKind::Class),
            (r"^(?:public\s+)?interface\s+(\w+)", DeclarationKind::Interface),
            (r"^(?:public\s+)?enum\s+(\w+)", DeclarationKind::Enum),
        ],
        "go" => &[
            (r"^type\s+(\w+)\s+struct", DeclarationKind::Struct),
            (r"^type\s+(\w+)\s+interface", DeclarationKind::Interface),
            (r"^func\s+\(\w+\s+\*?\w+\)\s+(\w+)", DeclarationKind::Method),
            (r"^func\s+(\w+)", DeclarationKind::Function),
        ],
        "rs" => &[
            (r"^(?:pub(?:\([^)]*\))?\s+)?struct\s+(\w+)", DeclarationKind::Struct),
            (r"^(?:pub(?:\([^)]*\))?\s+)?enum\s+(\w+)", DeclarationKind::Enum),
            (r"^(?:pub(?:\([^)]*\))?\s+)?trait\s+(\w+)", DeclarationKind::Trait),
            (r"^(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?fn\s+(\w+)", DeclarationKind::Function),
        ],
        "rb" => &[
            (r"^class\s+(\w+)", DeclarationKind::Class),
            (r"^module\s+(\w+)", DeclarationKind::Module),
            (r"^def\s+(\w+)", DeclarationKind::Function),
        ],
        _ => &[],
    }
}

/// Whether any patterns exist for this extension
pub fn has_patterns(ext: &str) -> bool {
    !patterns_for_extension(ext).is_empty()
}

/// Outline `source` with line patterns for `ext`
///
/// Returns `None` when the extension has no patterns.
pub fn pattern_outline(ext: &str, source: &str) -> Option<Vec<Declaration>> {
    let patterns: Vec<(Regex, DeclarationKind)> = patterns_for_extension(ext)
        .iter()
        .filter_map(|(pattern, kind)| Regex::new(pattern).ok().map(|re| (re, *kind)))
        .collect();
    if patterns.is_empty() {
        return None;
    }

    let lines: Vec<&str> = source.lines().collect();
    let mut starts: Vec<(usize, String, DeclarationKind)> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let hit = patterns.iter().find_map(|(re, kind)| {
            re.captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| (m.as_str().to_string(), *kind))
        });
        if let Some((name, kind)) = hit {
            starts.push((index + 1, name, kind));
        }
    }

    let mut declarations = Vec::new();
    for (i, (start, name, kind)) in starts.iter().enumerate() {
        let next = starts.get(i + 1).map(|(s, _, _)| *s - 1).unwrap_or(lines.len());
        let mut end = next;
        while end > *start && lines[end - 1].trim().is_empty() {
            end -= 1;
        }
        declarations.push(Declaration {
            name: name.clone(),
            kind: *kind,
            lines: LineRange::spanning(*start, end),
            members: Vec::new(),
        });
    }

    Some(declarations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_fallback_on_broken_source() {
        let source = "import os\n\nclass Broken(:\n    def method(self):\n        pass\n\ndef helper():\n    return 1\n";
        let outline = pattern_outline("py", source).unwrap();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].block_name(), "Broken class");
        // indented method stays inside the class, trailing blank trimmed
        assert_eq!(outline[0].lines, LineRange::new(3, 5).unwrap());
        assert_eq!(outline[1].block_name(), "helper function");
        assert_eq!(outline[1].lines, LineRange::new(7, 8).unwrap());
    }

    #[test]
    fn test_java_classes_split_at_next_match() {
        let source = "package x;\n\npublic class A {\n}\n\ninterface B {\n  void b();\n}\n";
        let outline = pattern_outline("java", source).unwrap();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].block_name(), "A class");
        assert_eq!(outline[0].lines, LineRange::new(3, 4).unwrap());
        assert_eq!(outline[1].block_name(), "B interface");
        assert_eq!(outline[1].lines, LineRange::new(6, 8).unwrap());
    }

    #[test]
    fn test_unknown_extension_has_no_patterns() {
        assert!(pattern_outline("toml", "[package]\n").is_none());
        assert!(!has_patterns("toml"));
    }
}
