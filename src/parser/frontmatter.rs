//! YAML front matter and review stamps
//!
//! Handles:
//! - BOM (Byte Order Mark) stripping
//! - Line ending normalization (CRLF → LF)
//! - `last_reviewed` from front matter or an inline `<!-- last_reviewed: ... -->` marker

use anyhow::{bail, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::models::timestamp::parse_timestamp;

/// Normalize content: strip BOM, normalize line endings
pub fn normalize_content(content: &str) -> String {
    let s = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split front matter from body
///
/// Front matter must open with `---` on the first line and close with a
/// `---` at column 0. Returns `(frontmatter, body)`.
pub fn split_frontmatter(content: &str) -> Result<(String, String)> {
    let Some(after_open) = content.strip_prefix("---\n") else {
        bail!("Document does not start with YAML front matter (---)")
    };

    // A closing fence right after the opening one means empty front matter
    if let Some(body) = after_open.strip_prefix("---\n") {
        return Ok((String::new(), body.to_string()));
    }

    let re = Regex::new(r"\n---[ \t]*\n|\n---[ \t]*$")?;
    match re.find(after_open) {
        Some(m) => {
            let frontmatter = after_open[..m.start()].to_string();
            let body = after_open[m.end()..].to_string();
            Ok((frontmatter, body))
        }
        None => bail!("Front matter not properly closed (--- must be at line start)"),
    }
}

/// Read a document's `last_reviewed` stamp
///
/// Front matter wins over the inline marker. Missing or unparseable
/// values yield `None`.
pub fn extract_last_reviewed(content: &str) -> Option<NaiveDateTime> {
    let normalized = normalize_content(content);

    if let Ok((frontmatter, _)) = split_frontmatter(&normalized) {
        if let Ok(serde_yaml::Value::Mapping(map)) =
            serde_yaml::from_str::<serde_yaml::Value>(&frontmatter)
        {
            if let Some(value) = map.get("last_reviewed") {
                let parsed = match value {
                    serde_yaml::Value::String(s) => parse_timestamp(s),
                    _ => None,
                };
                if parsed.is_some() {
                    return parsed;
                }
                log::debug!("Unparseable last_reviewed in front matter: {:?}", value);
            }
        }
    }

    let marker = Regex::new(r"<!--\s*last_reviewed:\s*(.+?)\s*-->").ok()?;
    marker
        .captures(&normalized)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_timestamp(m.as_str()))
}

/// Calculate SHA256 checksum of raw content
///
/// Returns checksum in format: `sha256:<hex>`
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}
