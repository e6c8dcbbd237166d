//! Repository implementations for database operations.

pub mod config;
pub mod external_account;
pub mod global_notification;
pub mod page;
pub mod update_post;
pub mod user;
pub mod user_group;
pub mod user_group_relation;
pub mod user_removal;

pub use config::ConfigRepository;
pub use external_account::ExternalAccountRepository;
pub use global_notification::GlobalNotificationRepository;
pub use page::PageRepository;
pub use update_post::UpdatePostRepository;
pub use user::UserRepository;
pub use user_group::UserGroupRepository;
pub use user_group_relation::{PageGroupRelationRepository, UserGroupRelationRepository};
pub use user_removal::UserRemovalRepository;
