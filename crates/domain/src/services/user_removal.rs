//! Cascading soft removal of a user.
//!
//! The cascade is an ordered list of steps. The first failing step aborts the
//! remaining ones; steps that already ran are not rolled back.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::store::StoreError;
use crate::models::user::User;

/// Steps of the removal cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalStep {
    LocateUser,
    MarkDeleted,
    RemoveExternalAccounts,
    RemovePageTree,
}

impl RemovalStep {
    pub const ORDER: [RemovalStep; 4] = [
        RemovalStep::LocateUser,
        RemovalStep::MarkDeleted,
        RemovalStep::RemoveExternalAccounts,
        RemovalStep::RemovePageTree,
    ];
}

impl fmt::Display for RemovalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemovalStep::LocateUser => "locate_user",
            RemovalStep::MarkDeleted => "mark_deleted",
            RemovalStep::RemoveExternalAccounts => "remove_external_accounts",
            RemovalStep::RemovePageTree => "remove_page_tree",
        };
        f.write_str(name)
    }
}

/// Persistence operations the cascade is built from.
#[async_trait]
pub trait UserRemovalSteps: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Sets the status to deleted and clears the credentials.
    async fn mark_deleted(&self, user: &User) -> Result<(), StoreError>;

    /// Returns the number of removed accounts.
    async fn remove_external_accounts(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Removes `path` and every page below it. Returns the number of pages.
    async fn remove_page_tree(&self, path: &str) -> Result<u64, StoreError>;
}

/// What the cascade did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalReport {
    pub username: Option<String>,
    pub completed: Vec<RemovalStep>,
    /// The step that aborted the cascade and its error.
    pub failed: Option<(RemovalStep, String)>,
}

impl RemovalReport {
    fn new() -> Self {
        Self {
            username: None,
            completed: Vec::new(),
            failed: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }

    fn fail(mut self, step: RemovalStep, error: impl fmt::Display) -> Self {
        tracing::warn!(step = %step, error = %error, "User removal aborted");
        self.failed = Some((step, error.to_string()));
        self
    }
}

/// Runs the removal cascade for `user_id`.
pub async fn remove_user(steps: &dyn UserRemovalSteps, user_id: Uuid) -> RemovalReport {
    let mut report = RemovalReport::new();

    let user = match steps.find_user(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return report.fail(RemovalStep::LocateUser, StoreError::NotFound),
        Err(e) => return report.fail(RemovalStep::LocateUser, e),
    };
    report.username = user.username.clone();
    report.completed.push(RemovalStep::LocateUser);

    if let Err(e) = steps.mark_deleted(&user).await {
        return report.fail(RemovalStep::MarkDeleted, e);
    }
    report.completed.push(RemovalStep::MarkDeleted);

    match steps.remove_external_accounts(user.id).await {
        Ok(count) => tracing::debug!(
            user_id = %user.id,
            count = count,
            "External accounts removed"
        ),
        Err(e) => return report.fail(RemovalStep::RemoveExternalAccounts, e),
    }
    report.completed.push(RemovalStep::RemoveExternalAccounts);

    // Invited users never got a username and own no page tree.
    if let Some(path) = user.home_path() {
        match steps.remove_page_tree(&path).await {
            Ok(count) => tracing::debug!(path = %path, count = count, "Page tree removed"),
            Err(e) => return report.fail(RemovalStep::RemovePageTree, e),
        }
    }
    report.completed.push(RemovalStep::RemovePageTree);

    tracing::info!(user_id = %user.id, "User removed");
    report
}
