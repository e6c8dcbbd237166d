//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod config;
pub mod external_account;
pub mod global_notification;
pub mod page;
pub mod update_post;
pub mod user;
pub mod user_group;

pub use config::ConfigEntity;
pub use external_account::{ExternalAccountEntity, ExternalAccountWithUserEntity};
pub use global_notification::GlobalNotificationEntity;
pub use page::PageEntity;
pub use update_post::UpdatePostEntity;
pub use user::UserEntity;
pub use user_group::{
    GroupMemberEntity, PageGroupRelationEntity, UserGroupEntity, UserGroupRelationEntity,
};
