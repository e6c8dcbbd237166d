//! Slack notification transport and OAuth token exchange.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::SlackConfig;
use domain::models::{ConfigSnapshot, SnapshotExt};

pub const CLIENT_ID_KEY: &str = "slack:clientId";
pub const CLIENT_SECRET_KEY: &str = "slack:clientSecret";
pub const TOKEN_KEY: &str = "slack:token";
pub const INCOMING_WEBHOOK_URL_KEY: &str = "slack:incomingWebhookUrl";
pub const INCOMING_WEBHOOK_PRIORITIZED_KEY: &str = "slack:isIncomingWebhookPrioritized";

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Slack app is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API error: {0}")]
    Api(String),
}

/// How notifications are delivered to Slack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackTransport {
    IncomingWebhook { url: String },
    Token { token: String },
}

/// Selects the transport from the `notification` namespace.
///
/// The webhook wins when it is prioritized or when no token is stored.
pub fn select_transport(config: &ConfigSnapshot) -> Option<SlackTransport> {
    let webhook = config.non_empty_str(INCOMING_WEBHOOK_URL_KEY);
    let token = config.non_empty_str(TOKEN_KEY);
    let prioritized = config.flag(INCOMING_WEBHOOK_PRIORITIZED_KEY);

    match (webhook, token) {
        (Some(url), Some(_)) if prioritized => Some(SlackTransport::IncomingWebhook {
            url: url.to_string(),
        }),
        (_, Some(token)) => Some(SlackTransport::Token {
            token: token.to_string(),
        }),
        (Some(url), None) => Some(SlackTransport::IncomingWebhook {
            url: url.to_string(),
        }),
        (None, None) => None,
    }
}

/// Whether the Slack app credentials needed for OAuth are present.
pub fn is_app_configured(config: &ConfigSnapshot) -> bool {
    config.non_empty_str(CLIENT_ID_KEY).is_some()
        && config.non_empty_str(CLIENT_SECRET_KEY).is_some()
}

#[derive(Debug, Deserialize)]
struct OAuthAccessResponse {
    ok: bool,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct SlackNotifier {
    client: Client,
    api_base_url: String,
    redirect_uri: String,
    transport: RwLock<Option<SlackTransport>>,
}

impl SlackNotifier {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            redirect_uri: config.oauth_redirect_uri.clone(),
            transport: RwLock::new(None),
        })
    }

    pub async fn transport(&self) -> Option<SlackTransport> {
        self.transport.read().await.clone()
    }

    /// Rebuilds the transport from the `notification` namespace.
    pub async fn reinitialize(&self, config: &ConfigSnapshot) {
        let transport = select_transport(config);
        match &transport {
            Some(SlackTransport::IncomingWebhook { .. }) => {
                info!("Slack transport initialized with incoming webhook")
            }
            Some(SlackTransport::Token { .. }) => info!("Slack transport initialized with token"),
            None => debug!("Slack transport disabled"),
        }
        *self.transport.write().await = transport;
    }

    /// Exchanges an OAuth `code` for an access token.
    pub async fn exchange_code(
        &self,
        config: &ConfigSnapshot,
        code: &str,
    ) -> Result<String, SlackError> {
        let (client_id, client_secret) = match (
            config.non_empty_str(CLIENT_ID_KEY),
            config.non_empty_str(CLIENT_SECRET_KEY),
        ) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err(SlackError::NotConfigured),
        };

        let url = format!("{}/oauth.access", self.api_base_url);
        let response: OAuthAccessResponse = self
            .client
            .post(&url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.ok, response.access_token) {
            (true, Some(token)) if !token.is_empty() => Ok(token),
            _ => Err(SlackError::Api(
                response.error.unwrap_or_else(|| "missing access_token".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(pairs: &[(&str, serde_json::Value)]) -> ConfigSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_select_transport_prefers_token() {
        let config = snapshot(&[
            (INCOMING_WEBHOOK_URL_KEY, json!("https://hooks.slack.com/services/x")),
            (TOKEN_KEY, json!("xoxp-1")),
        ]);
        assert_eq!(
            select_transport(&config),
            Some(SlackTransport::Token {
                token: "xoxp-1".to_string()
            })
        );
    }

    #[test]
    fn test_select_transport_prioritized_webhook() {
        let config = snapshot(&[
            (INCOMING_WEBHOOK_URL_KEY, json!("https://hooks.slack.com/services/x")),
            (TOKEN_KEY, json!("xoxp-1")),
            (INCOMING_WEBHOOK_PRIORITIZED_KEY, json!(true)),
        ]);
        assert!(matches!(
            select_transport(&config),
            Some(SlackTransport::IncomingWebhook { .. })
        ));
    }

    #[test]
    fn test_select_transport_none_when_blank() {
        let config = snapshot(&[(TOKEN_KEY, json!("")), (INCOMING_WEBHOOK_URL_KEY, json!(""))]);
        assert_eq!(select_transport(&config), None);
    }

    #[test]
    fn test_is_app_configured() {
        assert!(!is_app_configured(&snapshot(&[(CLIENT_ID_KEY, json!("id"))])));
        assert!(is_app_configured(&snapshot(&[
            (CLIENT_ID_KEY, json!("id")),
            (CLIENT_SECRET_KEY, json!("secret")),
        ])));
    }

    #[tokio::test]
    async fn test_exchange_code_requires_app_credentials() {
        let notifier = SlackNotifier::new(&SlackConfig::default()).unwrap();
        let result = notifier.exchange_code(&ConfigSnapshot::new(), "code").await;
        assert!(matches!(result, Err(SlackError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_reinitialize_replaces_transport() {
        let notifier = SlackNotifier::new(&SlackConfig::default()).unwrap();
        notifier
            .reinitialize(&snapshot(&[(TOKEN_KEY, json!("xoxp-1"))]))
            .await;
        assert!(notifier.transport().await.is_some());

        notifier.reinitialize(&ConfigSnapshot::new()).await;
        assert!(notifier.transport().await.is_none());
    }
}
