//! Wiki page models used by the admin surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub path: String,
    pub body: String,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A page to be written by an importer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub path: String,
    pub body: String,
    pub creator_id: Uuid,
}

/// Normalizes an imported title into a page path.
///
/// Slashes in the title become path separators, whitespace runs collapse and
/// empty segments are dropped.
pub fn page_path_from_title(prefix: &str, title: &str) -> String {
    let segments: Vec<String> = prefix
        .split('/')
        .chain(title.split('/'))
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}
