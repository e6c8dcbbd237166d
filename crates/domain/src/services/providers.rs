//! Authentication provider lifecycle.
//!
//! Each provider moves through `Disabled -> Enabling -> {Enabled | Error}`.
//! A failed setup always ends with the strategy torn down, so a provider is
//! never left registered with a half-applied configuration.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::config::{ConfigSnapshot, SnapshotExt};

/// External authentication providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Ldap,
    Saml,
    Google,
    GitHub,
    Twitter,
    Slack,
}

impl AuthProvider {
    pub const ALL: [AuthProvider; 6] = [
        AuthProvider::Ldap,
        AuthProvider::Saml,
        AuthProvider::Google,
        AuthProvider::GitHub,
        AuthProvider::Twitter,
        AuthProvider::Slack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Ldap => "ldap",
            AuthProvider::Saml => "saml",
            AuthProvider::Google => "google",
            AuthProvider::GitHub => "github",
            AuthProvider::Twitter => "twitter",
            AuthProvider::Slack => "slack",
        }
    }

    /// Configuration key of the provider's enable switch.
    pub fn enabled_key(&self) -> String {
        format!("security:passport-{}:isEnabled", self.as_str())
    }

    /// Prefix shared by all of the provider's configuration keys.
    pub fn key_prefix(&self) -> String {
        format!("security:passport-{}:", self.as_str())
    }

    pub fn is_enabled_in(&self, config: &ConfigSnapshot) -> bool {
        config.flag(&self.enabled_key())
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime state of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum ProviderState {
    Disabled,
    Enabling,
    Enabled,
    /// Setup failed; the strategy is not registered.
    Error(String),
}

impl ProviderState {
    pub fn is_active(&self) -> bool {
        matches!(self, ProviderState::Enabled)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StrategyError {
    #[error("{0} is required")]
    MissingSetting(String),

    #[error("{key} is invalid: {reason}")]
    InvalidSetting { key: String, reason: String },
}

/// Registry of active authentication strategies.
#[async_trait]
pub trait StrategyRegistry: Send + Sync {
    /// Unregisters the provider's strategy. Unregistering an absent strategy
    /// is a no-op.
    async fn reset(&self, provider: AuthProvider);

    /// Builds and registers the strategy from `config`.
    async fn setup(&self, provider: AuthProvider, config: &ConfigSnapshot)
        -> Result<(), StrategyError>;
}

/// Drives providers through their lifecycle on configuration changes.
pub struct ProviderLifecycle {
    registry: Arc<dyn StrategyRegistry>,
    states: RwLock<HashMap<AuthProvider, ProviderState>>,
}

impl ProviderLifecycle {
    pub fn new(registry: Arc<dyn StrategyRegistry>) -> Self {
        Self {
            registry,
            states: RwLock::new(HashMap::new()),
        }
    }

    pub async fn state(&self, provider: AuthProvider) -> ProviderState {
        self.states
            .read()
            .await
            .get(&provider)
            .cloned()
            .unwrap_or(ProviderState::Disabled)
    }

    /// States of every provider, in declaration order.
    pub async fn states(&self) -> Vec<(AuthProvider, ProviderState)> {
        let states = self.states.read().await;
        AuthProvider::ALL
            .iter()
            .map(|p| (*p, states.get(p).cloned().unwrap_or(ProviderState::Disabled)))
            .collect()
    }

    async fn set_state(&self, provider: AuthProvider, state: ProviderState) {
        self.states.write().await.insert(provider, state);
    }

    /// Tears the provider down and, when enabled in `config`, sets it up again.
    ///
    /// Returns the resulting state. On setup failure the strategy is reset a
    /// second time and the state carries the failure reason.
    pub async fn reinitialize(
        &self,
        provider: AuthProvider,
        config: &ConfigSnapshot,
    ) -> ProviderState {
        self.registry.reset(provider).await;
        self.set_state(provider, ProviderState::Disabled).await;

        if !provider.is_enabled_in(config) {
            tracing::info!(provider = %provider, "Authentication provider disabled");
            return ProviderState::Disabled;
        }

        self.set_state(provider, ProviderState::Enabling).await;
        let state = match self.registry.setup(provider, config).await {
            Ok(()) => {
                tracing::info!(provider = %provider, "Authentication provider enabled");
                ProviderState::Enabled
            }
            Err(e) => {
                self.registry.reset(provider).await;
                tracing::warn!(
                    provider = %provider,
                    error = %e,
                    "Authentication provider setup failed"
                );
                ProviderState::Error(e.to_string())
            }
        };
        self.set_state(provider, state.clone()).await;
        state
    }

    /// Initializes every provider from the current configuration.
    pub async fn initialize_all(&self, config: &ConfigSnapshot) {
        for provider in AuthProvider::ALL {
            self.reinitialize(provider, config).await;
        }
    }
}
