//! Subsystems the admin handlers re-initialize and call out to.

pub mod importer;
pub mod mailer;
pub mod passport;
pub mod search;
pub mod slack;
pub mod storage;

pub use importer::ImporterRegistry;
pub use mailer::{MailError, Mailer};
pub use passport::PassportRegistry;
pub use search::ElasticsearchIndexer;
pub use slack::{SlackError, SlackNotifier};
pub use storage::{FileStorage, StorageError};
