//! Domain models for the wiki admin surface.

pub mod config;
pub mod external_account;
pub mod global_notification;
pub mod importer;
pub mod page;
pub mod presets;
pub mod search;
pub mod settings;
pub mod update_post;
pub mod user;
pub mod user_group;

pub use config::{ConfigEntry, ConfigNamespace, ConfigSnapshot, SnapshotExt};
pub use external_account::{ExternalAccount, ExternalAccountWithUser};
pub use global_notification::{
    GlobalNotification, GlobalNotificationError, GlobalNotificationForm, GlobalNotificationInput,
    NotificationTarget, NotifyToType,
};
pub use importer::{ImportSource, ImportedPost, ImporterCredentials};
pub use page::{NewPage, Page};
pub use search::{SearchEvent, SearchProgress};
pub use settings::SettingsForm;
pub use update_post::UpdatePost;
pub use user::{PublicUser, User, UserStatus};
pub use user_group::{GroupMember, PageGroupRelation, UserGroup, UserGroupRelation};
