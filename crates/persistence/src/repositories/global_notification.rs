//! Global notification repository for database operations.

use domain::models::{GlobalNotificationInput, NotificationTarget};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GlobalNotificationEntity;
use crate::metrics::QueryTimer;

const NOTIFICATION_COLUMNS: &str = "id, notify_to_type, to_email, slack_channels, trigger_path, \
     trigger_events, is_enabled, created_at, updated_at";

/// Splits a target into its `(notify_to_type, to_email, slack_channels)` columns.
fn target_columns(target: &NotificationTarget) -> (&'static str, Option<&str>, Option<&str>) {
    match target {
        NotificationTarget::Mail { to_email } => ("mail", Some(to_email.as_str()), None),
        NotificationTarget::Slack { slack_channels } => {
            ("slack", None, Some(slack_channels.as_str()))
        }
    }
}

/// Repository for global notification rules.
#[derive(Clone)]
pub struct GlobalNotificationRepository {
    pool: PgPool,
}

impl GlobalNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<GlobalNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_global_notifications");
        let result = sqlx::query_as::<_, GlobalNotificationEntity>(&format!(
            "SELECT {} FROM global_notification_settings ORDER BY created_at, id",
            NOTIFICATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<GlobalNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_global_notification_by_id");
        let result = sqlx::query_as::<_, GlobalNotificationEntity>(&format!(
            "SELECT {} FROM global_notification_settings WHERE id = $1",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        input: &GlobalNotificationInput,
    ) -> Result<GlobalNotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_global_notification");
        let (notify_to_type, to_email, slack_channels) = target_columns(&input.target);
        let result = sqlx::query_as::<_, GlobalNotificationEntity>(&format!(
            r#"
            INSERT INTO global_notification_settings
                (notify_to_type, to_email, slack_channels, trigger_path, trigger_events)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(notify_to_type)
        .bind(to_email)
        .bind(slack_channels)
        .bind(&input.trigger_path)
        .bind(&input.trigger_events)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replaces the rule's target, path and events. The enabled flag is kept.
    pub async fn update(
        &self,
        id: Uuid,
        input: &GlobalNotificationInput,
    ) -> Result<Option<GlobalNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_global_notification");
        let (notify_to_type, to_email, slack_channels) = target_columns(&input.target);
        let result = sqlx::query_as::<_, GlobalNotificationEntity>(&format!(
            r#"
            UPDATE global_notification_settings
            SET notify_to_type = $2, to_email = $3, slack_channels = $4,
                trigger_path = $5, trigger_events = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(notify_to_type)
        .bind(to_email)
        .bind(slack_channels)
        .bind(&input.trigger_path)
        .bind(&input.trigger_events)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn set_enabled(
        &self,
        id: Uuid,
        enabled: bool,
    ) -> Result<Option<GlobalNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("toggle_global_notification");
        let result = sqlx::query_as::<_, GlobalNotificationEntity>(&format!(
            r#"
            UPDATE global_notification_settings
            SET is_enabled = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(enabled)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn delete(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_global_notification");
        let result = sqlx::query("DELETE FROM global_notification_settings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected());
        timer.record();
        result
    }
}
