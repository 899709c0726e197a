//! Check service - run the staleness checker over git changes

use serde::Serialize;

use crate::checker::Checker;
use crate::context::ProjectContext;
use crate::git;
use crate::models::CheckFailure;
use crate::Result;

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub staged: bool,
    pub files_checked: usize,
    pub map_updated: bool,
    pub failures: Vec<CheckFailure>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check staged changes, or the unstaged ones when `unstaged` is set
pub fn check_project(ctx: &ProjectContext, unstaged: bool) -> Result<CheckOutcome> {
    let store = ctx.load_map()?;
    let map = store.map();

    let mut changes = if unstaged {
        git::unstaged_changes(&ctx.root)?
    } else {
        git::staged_changes(&ctx.root)?
    };

    let map_file = ctx.map_file();
    for change in &mut changes {
        change.is_map_file = change.path == map_file;
    }
    let map_updated = changes.iter().any(|c| c.is_map_file);
    log::debug!(
        "{} changed file(s), map updated: {}",
        changes.len(),
        map_updated
    );

    let docs = ctx.documents(map.settings.fuzzy_match);
    let failures = Checker::new(map, &docs).check_changes(&changes, map_updated);

    Ok(CheckOutcome {
        staged: !unstaged,
        files_checked: changes.iter().filter(|c| !c.is_map_file).count(),
        map_updated,
        failures,
    })
}
