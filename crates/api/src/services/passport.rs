//! In-process authentication strategy registry.
//!
//! A strategy is registered once its provider configuration passes the
//! checks below. Login flows look strategies up by provider.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use domain::models::{ConfigSnapshot, SnapshotExt};
use domain::services::{AuthProvider, StrategyError, StrategyRegistry};

/// Settings a registered strategy was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDescriptor {
    pub provider: AuthProvider,
    pub callback_path: String,
    /// Client identifier, LDAP server URL or SAML entry point.
    pub endpoint: String,
    pub same_username_identical: bool,
}

#[derive(Default)]
pub struct PassportRegistry {
    strategies: RwLock<HashMap<AuthProvider, StrategyDescriptor>>,
}

impl PassportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, provider: AuthProvider) -> Option<StrategyDescriptor> {
        self.strategies.read().await.get(&provider).cloned()
    }

    pub async fn is_registered(&self, provider: AuthProvider) -> bool {
        self.strategies.read().await.contains_key(&provider)
    }
}

fn required<'a>(config: &'a ConfigSnapshot, key: String) -> Result<&'a str, StrategyError> {
    config
        .non_empty_str(&key)
        .ok_or(StrategyError::MissingSetting(key))
}

/// Builds the descriptor for `provider`, checking its required settings.
pub fn build_descriptor(
    provider: AuthProvider,
    config: &ConfigSnapshot,
) -> Result<StrategyDescriptor, StrategyError> {
    let prefix = provider.key_prefix();
    let key = |name: &str| format!("{}{}", prefix, name);

    let endpoint = match provider {
        AuthProvider::Ldap => {
            let url_key = key("serverUrl");
            let url = required(config, url_key.clone())?;
            if !(url.starts_with("ldap://") || url.starts_with("ldaps://")) {
                return Err(StrategyError::InvalidSetting {
                    key: url_key,
                    reason: "must start with ldap:// or ldaps://".to_string(),
                });
            }
            if config.flag(&key("isUserBind")) {
                required(config, key("bindDN"))?;
            }
            url.to_string()
        }
        AuthProvider::Saml => {
            let entry_point = required(config, key("entryPoint"))?.to_string();
            required(config, key("issuer"))?;
            let cert_key = key("cert");
            let cert = required(config, cert_key.clone())?;
            if !cert.contains("BEGIN CERTIFICATE") {
                return Err(StrategyError::InvalidSetting {
                    key: cert_key,
                    reason: "must be a PEM encoded certificate".to_string(),
                });
            }
            entry_point
        }
        AuthProvider::Google | AuthProvider::GitHub => {
            required(config, key("clientSecret"))?;
            required(config, key("clientId"))?.to_string()
        }
        AuthProvider::Twitter | AuthProvider::Slack => {
            required(config, key("consumerSecret"))?;
            required(config, key("consumerKey"))?.to_string()
        }
    };

    let callback_path = match provider {
        AuthProvider::Saml => config
            .non_empty_str(&key("callbackUrl"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("/passport/{}/callback", provider.as_str())),
        _ => format!("/passport/{}/callback", provider.as_str()),
    };

    Ok(StrategyDescriptor {
        provider,
        callback_path,
        endpoint,
        same_username_identical: config.flag(&key("isSameUsernameTreatedAsIdenticalUser")),
    })
}

#[async_trait]
impl StrategyRegistry for PassportRegistry {
    async fn reset(&self, provider: AuthProvider) {
        if self.strategies.write().await.remove(&provider).is_some() {
            tracing::debug!(provider = %provider, "Strategy unregistered");
        }
    }

    async fn setup(
        &self,
        provider: AuthProvider,
        config: &ConfigSnapshot,
    ) -> Result<(), StrategyError> {
        let descriptor = build_descriptor(provider, config)?;
        tracing::debug!(
            provider = %provider,
            callback_path = %descriptor.callback_path,
            "Strategy registered"
        );
        self.strategies.write().await.insert(provider, descriptor);
        Ok(())
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
    fn test_google_requires_client_credentials() {
        let config = snapshot(&[("security:passport-google:clientId", json!("id"))]);
        assert_eq!(
            build_descriptor(AuthProvider::Google, &config),
            Err(StrategyError::MissingSetting(
                "security:passport-google:clientSecret".to_string()
            ))
        );
    }

    #[test]
    fn test_ldap_rejects_non_ldap_url() {
        let config = snapshot(&[(
            "security:passport-ldap:serverUrl",
            json!("http://ldap.example.com"),
        )]);
        assert!(matches!(
            build_descriptor(AuthProvider::Ldap, &config),
            Err(StrategyError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_ldap_user_bind_needs_bind_dn() {
        let config = snapshot(&[
            ("security:passport-ldap:serverUrl", json!("ldaps://ldap.example.com/dc=example")),
            ("security:passport-ldap:isUserBind", json!(true)),
        ]);
        assert!(build_descriptor(AuthProvider::Ldap, &config).is_err());
    }

    #[test]
    fn test_saml_uses_configured_callback() {
        let config = snapshot(&[
            ("security:passport-saml:entryPoint", json!("https://idp.example.com/sso")),
            ("security:passport-saml:issuer", json!("wiki")),
            (
                "security:passport-saml:cert",
                json!("-----BEGIN CERTIFICATE-----\nMIIC\n-----END CERTIFICATE-----"),
            ),
            ("security:passport-saml:callbackUrl", json!("https://wiki.example.com/saml")),
        ]);
        let descriptor = build_descriptor(AuthProvider::Saml, &config).unwrap();
        assert_eq!(descriptor.callback_path, "https://wiki.example.com/saml");
        assert_eq!(descriptor.endpoint, "https://idp.example.com/sso");
    }

    #[tokio::test]
    async fn test_setup_and_reset() {
        let registry = PassportRegistry::new();
        let config = snapshot(&[
            ("security:passport-twitter:consumerKey", json!("key")),
            ("security:passport-twitter:consumerSecret", json!("secret")),
        ]);

        registry.setup(AuthProvider::Twitter, &config).await.unwrap();
        let descriptor = registry.get(AuthProvider::Twitter).await.unwrap();
        assert_eq!(descriptor.callback_path, "/passport/twitter/callback");

        registry.reset(AuthProvider::Twitter).await;
        assert!(!registry.is_registered(AuthProvider::Twitter).await);
        // second reset is a no-op
        registry.reset(AuthProvider::Twitter).await;
    }
}
