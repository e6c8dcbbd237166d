//! Wiki user account models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a user account.
///
/// Stored as a small integer; the numeric codes are part of the persisted
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Registered,
    Active,
    Suspended,
    Deleted,
    Invited,
}

impl UserStatus {
    pub fn code(&self) -> i16 {
        match self {
            UserStatus::Registered => 1,
            UserStatus::Active => 2,
            UserStatus::Suspended => 3,
            UserStatus::Deleted => 4,
            UserStatus::Invited => 5,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(UserStatus::Registered),
            2 => Some(UserStatus::Active),
            3 => Some(UserStatus::Suspended),
            4 => Some(UserStatus::Deleted),
            5 => Some(UserStatus::Invited),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Registered => "registered",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Deleted => "deleted",
            UserStatus::Invited => "invited",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a wiki user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Invited users have no username until they activate.
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: String,
    #[serde(skip_serializing)] // Never serialize password hash to API responses
    pub password_hash: Option<String>,
    pub admin: bool,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown in admin messages.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.email)
    }

    /// Root path of the user's personal page tree.
    pub fn home_path(&self) -> Option<String> {
        self.username.as_deref().map(user_home_path)
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Fields that are safe to return to clients.
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            admin: self.admin,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Path of a user's personal page tree.
pub fn user_home_path(username: &str) -> String {
    format!("/user/{}", username)
}

/// Client-facing subset of [`User`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: String,
    pub admin: bool,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

/// Request to invite users by email.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InviteUsersRequest {
    /// Newline-separated addresses.
    #[validate(custom(function = "shared::validation::validate_email_lines"))]
    pub email_list: String,

    #[serde(default)]
    pub send_email: bool,
}

/// Outcome of inviting one address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitedUser {
    pub email: String,
    /// Initial password; `None` when the address was already registered.
    pub password: Option<String>,
}

/// Request body for a password reset.
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub user_id: Uuid,
}

/// Result of a password reset.
#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordResult {
    pub user: PublicUser,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: Some("alice".to_string()),
            name: Some("Alice".to_string()),
            email: SafeEmail().fake(),
            password_hash: Some("$argon2id$...".to_string()),
            admin: false,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            UserStatus::Registered,
            UserStatus::Active,
            UserStatus::Suspended,
            UserStatus::Deleted,
            UserStatus::Invited,
        ] {
            assert_eq!(UserStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(UserStatus::from_code(0), None);
        assert_eq!(UserStatus::Deleted.code(), 4);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = sample_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn test_home_path() {
        let mut user = sample_user();
        assert_eq!(user.home_path().as_deref(), Some("/user/alice"));

        user.username = None;
        assert!(user.home_path().is_none());
    }

    #[test]
    fn test_display_name_falls_back() {
        let mut user = sample_user();
        assert_eq!(user.display_name(), "Alice");

        user.name = None;
        assert_eq!(user.display_name(), "alice");

        user.username = None;
        assert_eq!(user.display_name(), user.email);
    }

    #[test]
    fn test_invite_request_validation() {
        let request = InviteUsersRequest {
            email_list: format!("{}\n{}", SafeEmail().fake::<String>(), "nope"),
            send_email: false,
        };
        assert!(request.validate().is_err());

        let request = InviteUsersRequest {
            email_list: SafeEmail().fake(),
            send_email: true,
        };
        assert!(request.validate().is_ok());
    }
}
