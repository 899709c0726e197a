//! Markdown heading lookup and section extraction

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::RegexBuilder;

use super::frontmatter::{normalize_content, split_frontmatter};

/// A heading found in a document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    /// Byte offset of the heading in the body
    pub offset: usize,
}

/// Title and text of an extracted section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    /// The heading line plus everything up to the next heading of the
    /// same or higher level, trimmed
    pub content: String,
}

/// Strip front matter so its fences are not read as setext headings
fn document_body(content: &str) -> String {
    let normalized = normalize_content(content);
    match split_frontmatter(&normalized) {
        Ok((_, body)) => body,
        Err(_) => normalized,
    }
}

/// All ATX and setext headings in `body`, in document order
pub fn collect_headings(body: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let level = match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    HeadingLevel::H3 => 3,
                    HeadingLevel::H4 => 4,
                    HeadingLevel::H5 => 5,
                    HeadingLevel::H6 => 6,
                };
                current = Some(Heading {
                    level,
                    title: String::new(),
                    offset: range.start,
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(mut heading) = current.take() {
                    heading.title = heading.title.trim().to_string();
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }

    headings
}

/// GitHub-style slug: lowercase, punctuation dropped, spaces to hyphens
pub fn slugify(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

fn heading_matches(title: &str, anchor: &str, fuzzy: bool) -> bool {
    if slugify(title) == anchor.to_lowercase() {
        return true;
    }
    if !fuzzy {
        return false;
    }

    // Each '-' in the anchor may stand for a hyphen, a space, or nothing
    let pattern = anchor
        .split('-')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[- ]?");

    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(title))
        .unwrap_or(false)
}

/// Extract the section headed by `anchor`
///
/// With `fuzzy`, an exact slug match is preferred and otherwise the first
/// heading whose title contains the anchor text (case-insensitive) wins.
pub fn extract_section(content: &str, anchor: &str, fuzzy: bool) -> Option<Section> {
    let anchor = anchor.trim_start_matches('#').trim();
    if anchor.is_empty() {
        return None;
    }

    let body = document_body(content);
    let headings = collect_headings(&body);

    let index = headings
        .iter()
        .position(|h| heading_matches(&h.title, anchor, false))
        .or_else(|| {
            fuzzy
                .then(|| {
                    headings
                        .iter()
                        .position(|h| heading_matches(&h.title, anchor, true))
                })
                .flatten()
        })?;

    let heading = &headings[index];
    let end = headings[index + 1..]
        .iter()
        .find(|h| h.level <= heading.level)
        .map(|h| h.offset)
        .unwrap_or(body.len());

    Some(Section {
        title: heading.title.clone(),
        content: body[heading.offset..end].trim().to_string(),
    })
}
