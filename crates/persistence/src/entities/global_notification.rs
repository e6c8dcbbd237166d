//! Global notification entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{GlobalNotification, NotificationTarget};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the global_notification_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct GlobalNotificationEntity {
    pub id: Uuid,
    pub notify_to_type: String,
    pub to_email: Option<String>,
    pub slack_channels: Option<String>,
    pub trigger_path: String,
    pub trigger_events: Vec<String>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GlobalNotificationEntity> for GlobalNotification {
    fn from(entity: GlobalNotificationEntity) -> Self {
        let target = if entity.notify_to_type == "slack" {
            NotificationTarget::Slack {
                slack_channels: entity.slack_channels.unwrap_or_default(),
            }
        } else {
            NotificationTarget::Mail {
                to_email: entity.to_email.unwrap_or_default(),
            }
        };

        Self {
            id: entity.id,
            trigger_path: entity.trigger_path,
            trigger_events: entity.trigger_events,
            target,
            is_enabled: entity.is_enabled,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
