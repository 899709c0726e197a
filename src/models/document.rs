use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

/// A read-only view of one chunk of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSection {
    pub path: PathBuf,
    pub anchor: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<NaiveDateTime>,
}
