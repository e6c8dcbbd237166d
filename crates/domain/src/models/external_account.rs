//! Linked third-party identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::PublicUser;

/// A third-party identity linked to a wiki user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAccount {
    pub id: Uuid,
    /// Provider name, e.g. `ldap`, `google`, `saml`.
    pub provider_type: String,
    pub account_id: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ExternalAccount {
    /// `<providerType>/<accountId>`
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider_type, self.account_id)
    }
}

/// Account joined with its owner, as listed in the admin view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAccountWithUser {
    #[serde(flatten)]
    pub account: ExternalAccount,
    pub user: Option<PublicUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let account = ExternalAccount {
            id: Uuid::new_v4(),
            provider_type: "github".to_string(),
            account_id: "octocat".to_string(),
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        assert_eq!(account.label(), "github/octocat");
    }
}
