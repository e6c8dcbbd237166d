//! Domain services for the wiki admin surface.
//!
//! Services hold the admin workflows and talk to persistence and external
//! systems through the traits defined here.

pub mod config_service;
pub mod importer;
pub mod providers;
pub mod search;
pub mod settings_pipeline;
pub mod store;
pub mod user_group;
pub mod user_removal;

pub use config_service::{ConfigService, ConfigStore, InMemoryConfigStore};
pub use importer::{import_posts, ImportError, ImportSourceClient, PageWriter};
pub use providers::{
    AuthProvider, ProviderLifecycle, ProviderState, StrategyError, StrategyRegistry,
};
pub use search::{rebuild_index, SearchError, SearchIndexer};
pub use settings_pipeline::{
    apply_settings, bind_form, persist_form, Rejection, SettingsError, SettingsOutcome,
};
pub use store::StoreError;
pub use user_group::{create_group, rename_group, GroupError, UserGroupStore};
pub use user_removal::{remove_user, RemovalReport, RemovalStep, UserRemovalSteps};
