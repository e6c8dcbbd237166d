//! Site-wide notification rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Delivery channel of a global notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyToType {
    Mail,
    Slack,
}

impl NotifyToType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyToType::Mail => "mail",
            NotifyToType::Slack => "slack",
        }
    }
}

impl fmt::Display for NotifyToType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotifyToType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mail" => Ok(NotifyToType::Mail),
            "slack" => Ok(NotifyToType::Slack),
            _ => Err(format!("Invalid notification type: {}", s)),
        }
    }
}

/// Destination of a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "notifyToType", rename_all = "lowercase")]
pub enum NotificationTarget {
    #[serde(rename_all = "camelCase")]
    Mail { to_email: String },
    #[serde(rename_all = "camelCase")]
    Slack { slack_channels: String },
}

impl NotificationTarget {
    pub fn notify_to_type(&self) -> NotifyToType {
        match self {
            NotificationTarget::Mail { .. } => NotifyToType::Mail,
            NotificationTarget::Slack { .. } => NotifyToType::Slack,
        }
    }
}

/// A persisted global notification rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNotification {
    pub id: Uuid,
    pub trigger_path: String,
    pub trigger_events: Vec<String>,
    #[serde(flatten)]
    pub target: NotificationTarget,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values a rule is created or updated from.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalNotificationInput {
    pub trigger_path: String,
    pub trigger_events: Vec<String>,
    pub target: NotificationTarget,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GlobalNotificationError {
    #[error("undefined notification type")]
    UndefinedType,
}

/// Submitted notification form.
///
/// Event checkboxes arrive as arbitrary `triggerEvent*` fields and are
/// collected by [`GlobalNotificationForm::trigger_events`].
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GlobalNotificationForm {
    pub id: Option<Uuid>,

    pub notify_to_type: String,

    #[validate(email(message = "Destination must be a valid email address"))]
    pub to_email: Option<String>,

    pub slack_channels: Option<String>,

    #[validate(custom(function = "shared::validation::validate_path_pattern"))]
    pub trigger_path: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GlobalNotificationForm {
    /// Values of every non-empty field whose name starts with `triggerEvent`.
    pub fn trigger_events(&self) -> Vec<String> {
        self.extra
            .iter()
            .filter(|(key, _)| key.starts_with("triggerEvent"))
            .filter_map(|(_, value)| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Resolves the delivery target. Only mail delivery is available.
    pub fn target(&self) -> Result<NotificationTarget, GlobalNotificationError> {
        match self.notify_to_type.parse::<NotifyToType>() {
            Ok(NotifyToType::Mail) => Ok(NotificationTarget::Mail {
                to_email: self.to_email.clone().unwrap_or_default(),
            }),
            _ => Err(GlobalNotificationError::UndefinedType),
        }
    }

    pub fn into_input(self) -> Result<GlobalNotificationInput, GlobalNotificationError> {
        let target = self.target()?;
        Ok(GlobalNotificationInput {
            trigger_events: self.trigger_events(),
            trigger_path: self.trigger_path,
            target,
        })
    }
}

/// Query string of the enable/disable toggle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleGlobalNotificationQuery {
    pub id: Uuid,
    #[serde(default)]
    pub is_enabled: String,
}

impl ToggleGlobalNotificationQuery {
    /// Only the literal `true` enables.
    pub fn enable(&self) -> bool {
        self.is_enabled == "true"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> GlobalNotificationForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_trigger_events_collects_non_empty_fields() {
        let form = form(json!({
            "notifyToType": "mail",
            "toEmail": "ops@example.com",
            "triggerPath": "/team/*",
            "triggerEvent:pageCreate": "pageCreate",
            "triggerEvent:pageEdit": "",
            "triggerEvent:comment": "comment",
            "unrelated": "x"
        }));

        let events = form.trigger_events();
        assert_eq!(events, vec!["comment", "pageCreate"]);
    }

    #[test]
    fn test_mail_target() {
        let form = form(json!({
            "notifyToType": "mail",
            "toEmail": "ops@example.com",
            "triggerPath": "/"
        }));
        assert_eq!(
            form.target().unwrap(),
            NotificationTarget::Mail {
                to_email: "ops@example.com".to_string()
            }
        );
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_slack_target_is_undefined() {
        let form = form(json!({
            "notifyToType": "slack",
            "slackChannels": "#general",
            "triggerPath": "/"
        }));
        assert_eq!(form.target(), Err(GlobalNotificationError::UndefinedType));
    }

    #[test]
    fn test_unknown_type_is_undefined() {
        let form = form(json!({ "notifyToType": "fax", "triggerPath": "/" }));
        assert!(form.into_input().is_err());
    }

    #[test]
    fn test_trigger_path_must_be_absolute() {
        let form = form(json!({ "notifyToType": "mail", "triggerPath": "team" }));
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_notification_serializes_target_inline() {
        let notification = GlobalNotification {
            id: Uuid::new_v4(),
            trigger_path: "/".to_string(),
            trigger_events: vec!["pageCreate".to_string()],
            target: NotificationTarget::Mail {
                to_email: "ops@example.com".to_string(),
            },
            is_enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["notifyToType"], "mail");
        assert_eq!(json["toEmail"], "ops@example.com");
        assert_eq!(json["isEnabled"], true);
    }

    #[test]
    fn test_toggle_query() {
        let query: ToggleGlobalNotificationQuery = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "isEnabled": "true"
        }))
        .unwrap();
        assert!(query.enable());

        let query: ToggleGlobalNotificationQuery = serde_json::from_value(json!({
            "id": Uuid::nil(),
            "isEnabled": "1"
        }))
        .unwrap();
        assert!(!query.enable());
    }
}
