//! Per-path Slack notification rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Posts page updates under `path_pattern` to a Slack channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    pub id: Uuid,
    pub path_pattern: String,
    /// Channel name without the leading `#`.
    pub channel: String,
    pub creator_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddUpdatePostRequest {
    #[validate(custom(function = "shared::validation::validate_path_pattern"))]
    pub path_pattern: String,

    #[validate(length(min = 1, max = 80, message = "Channel must be 1-80 characters"))]
    pub channel: String,
}

impl AddUpdatePostRequest {
    pub fn normalized_channel(&self) -> String {
        self.channel.trim().trim_start_matches('#').to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveUpdatePostRequest {
    pub id: Uuid,
}
