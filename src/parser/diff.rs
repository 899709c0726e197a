//! Unified diff hunk parsing

use crate::models::{ChangeType, ChangedLine};

/// Extract changed lines from unified diff text for a single file
///
/// Line numbers refer to the new version of the file. Removed lines are
/// reported at the position they were removed from and do not advance the
/// counter.
pub fn parse_unified_diff(diff: &str) -> Vec<ChangedLine> {
    let mut changes = Vec::new();
    let mut current: Option<usize> = None;

    for line in diff.lines() {
        if line.starts_with("@@") {
            current = parse_hunk_start(line);
            continue;
        }
        if line.starts_with("diff ") {
            current = None;
            continue;
        }
        // Outside a hunk everything is header
        let Some(line_number) = current.as_mut() else {
            continue;
        };

        match line.chars().next() {
            Some('+') => {
                changes.push(ChangedLine {
                    line_number: *line_number,
                    change_type: ChangeType::Added,
                });
                *line_number += 1;
            }
            Some('-') => changes.push(ChangedLine {
                line_number: *line_number,
                change_type: ChangeType::Removed,
            }),
            Some('\\') => {}
            _ => *line_number += 1,
        }
    }

    changes
}

/// `@@ -a,b +c,d @@` → `c`
fn parse_hunk_start(header: &str) -> Option<usize> {
    let plus = header.split_whitespace().find(|part| part.starts_with('+'))?;
    let start = plus.trim_start_matches('+').split(',').next()?;
    start.parse().ok()
}
