//! User group and group relation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::PublicUser;

/// A named group of users that pages can be granted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroup {
    pub id: Uuid,
    pub name: String,
    /// Public URL of the group picture.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserGroup {
    /// Storage path for the group picture with the given extension.
    pub fn picture_path(&self, extension: &str) -> String {
        if extension.is_empty() {
            format!("userGroup/{}", self.id)
        } else {
            format!("userGroup/{}.{}", self.id, extension)
        }
    }
}

/// Membership of a user in a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupRelation {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Membership joined with the member's public fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub relation_id: Uuid,
    pub group_id: Uuid,
    pub user: PublicUser,
    pub created_at: DateTime<Utc>,
}

/// Grant of a page to a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGroupRelation {
    pub id: Uuid,
    pub group_id: Uuid,
    pub page_id: Uuid,
    pub page_path: String,
    pub created_at: DateTime<Utc>,
}

/// Group with its members, as shown on the group list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupWithMembers {
    #[serde(flatten)]
    pub group: UserGroup,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Group name must be 1-255 characters"))]
    pub user_group_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RenameUserGroupRequest {
    #[validate(length(min = 1, max = 255, message = "Group name must be 1-255 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RemoveUserGroupRequest {
    pub user_group_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateGroupRelationRequest {
    pub user_group_id: Uuid,

    #[validate(length(min = 1, message = "Username is required"))]
    pub user_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_path() {
        let group = UserGroup {
            id: Uuid::nil(),
            name: "dev".to_string(),
            image: None,
            created_at: Utc::now(),
        };
        assert_eq!(
            group.picture_path("png"),
            "userGroup/00000000-0000-0000-0000-000000000000.png"
        );
        assert_eq!(
            group.picture_path(""),
            "userGroup/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_create_request_rejects_empty_name() {
        let request = CreateUserGroupRequest {
            user_group_name: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_group_with_members_flattens_group() {
        let group = UserGroup {
            id: Uuid::new_v4(),
            name: "ops".to_string(),
            image: Some("/uploads/userGroup/x.png".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserGroupWithMembers {
            group,
            members: vec![],
        })
        .unwrap();
        assert_eq!(json["name"], "ops");
        assert!(json["members"].as_array().unwrap().is_empty());
    }
}
