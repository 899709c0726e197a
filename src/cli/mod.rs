//! Command-line presentation
//!
//! Every command resolves a `ProjectContext`, calls its service and renders
//! the result. Nothing below `cli` prints.

pub mod check;
pub mod graph;
pub mod hook;
pub mod lint;
pub mod review;
pub mod suggest;
pub mod touch;
pub mod trace;
pub mod update;

use serde::Serialize;

use crate::Result;

/// How a command ended, mapped to the process exit code by `main`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report
    Clean,
    /// The command ran and found failures the user must act on
    Failures,
}

impl Outcome {
    pub fn from_clean(clean: bool) -> Self {
        if clean {
            Self::Clean
        } else {
            Self::Failures
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Failures => 1,
        }
    }
}

/// Exit code for errors that stop a command from running at all
pub const EXIT_ERROR: i32 = 2;

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Indent every line of a multi-line text block
pub(crate) fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}
