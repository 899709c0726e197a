// Alignment Map - keeps code blocks traceable to the documentation that describes them
// Blocks of source lines are mapped to doc sections; commits that touch a block
// must keep the map and its documents current.

pub mod checker;
pub mod cli;
pub mod context;
pub mod error;
pub mod git;
pub mod locator;
pub mod models;
pub mod parser;
pub mod services;
pub mod store;
pub mod validator;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use context::ProjectContext;
pub use error::AlignmentError;
pub use models::{AlignmentMap, Block, FileMapping, LineRange};
pub use store::MapStore;
