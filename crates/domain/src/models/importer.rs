//! Third-party content import models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Service content is imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Esa,
    Qiita,
}

impl ImportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportSource::Esa => "esa",
            ImportSource::Qiita => "qiita",
        }
    }

    /// Configuration key holding the team name.
    pub fn team_name_key(&self) -> &'static str {
        match self {
            ImportSource::Esa => "importer:esa:team_name",
            ImportSource::Qiita => "importer:qiita:team_name",
        }
    }

    /// Configuration key holding the access token.
    pub fn access_token_key(&self) -> &'static str {
        match self {
            ImportSource::Esa => "importer:esa:access_token",
            ImportSource::Qiita => "importer:qiita:access_token",
        }
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Credentials of a team on an import source.
#[derive(Clone, PartialEq, Eq)]
pub struct ImporterCredentials {
    pub team_name: String,
    pub access_token: String,
}

impl fmt::Debug for ImporterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImporterCredentials")
            .field("team_name", &self.team_name)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// A post fetched from an import source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedPost {
    /// Category or folder path on the source, may be empty.
    pub category: String,
    pub title: String,
    pub body: String,
}

/// Joins per-post import errors into the message shown to the admin.
pub fn join_import_errors(errors: &[String]) -> String {
    format!("<br> - {}", errors.join("<br> - "))
}
