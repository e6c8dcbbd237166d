//! esa.io and Qiita:Team API clients.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ImporterConfig;
use domain::models::{ConfigSnapshot, ImportSource, ImportedPost, ImporterCredentials, SnapshotExt};
use domain::services::{ImportError, ImportSourceClient};

const PER_PAGE: u32 = 100;

/// Reads the credentials of `source` from the `crowi` namespace.
pub fn credentials_from(
    source: ImportSource,
    config: &ConfigSnapshot,
) -> Option<ImporterCredentials> {
    Some(ImporterCredentials {
        team_name: config.non_empty_str(source.team_name_key())?.to_string(),
        access_token: config.non_empty_str(source.access_token_key())?.to_string(),
    })
}

async fn send(source: ImportSource, request: RequestBuilder) -> Result<Response, ImportError> {
    let response = request.send().await.map_err(|e| ImportError::Request {
        service: source,
        message: e.to_string(),
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ImportError::Api {
            service: source,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    source: ImportSource,
    response: Response,
) -> Result<T, ImportError> {
    response.json().await.map_err(|e| ImportError::Request {
        service: source,
        message: e.to_string(),
    })
}

// ============================================================================
// esa.io
// ============================================================================

#[derive(Debug, Deserialize)]
struct EsaPostsResponse {
    posts: Vec<EsaPost>,
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EsaPost {
    name: String,
    #[serde(default)]
    body_md: String,
    #[serde(default)]
    category: Option<String>,
}

pub struct EsaClient {
    client: Client,
    base_url: String,
    credentials: ImporterCredentials,
}

impl EsaClient {
    pub fn new(client: Client, base_url: &str, credentials: ImporterCredentials) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn team_url(&self) -> String {
        format!("{}/v1/teams/{}", self.base_url, self.credentials.team_name)
    }
}

#[async_trait]
impl ImportSourceClient for EsaClient {
    fn source(&self) -> ImportSource {
        ImportSource::Esa
    }

    async fn test_connection(&self) -> Result<(), ImportError> {
        let request = self
            .client
            .get(self.team_url())
            .bearer_auth(&self.credentials.access_token);
        send(ImportSource::Esa, request).await?;
        Ok(())
    }

    async fn fetch_posts(
        &self,
        page: u32,
    ) -> Result<(Vec<ImportedPost>, Option<u32>), ImportError> {
        let request = self
            .client
            .get(format!("{}/posts", self.team_url()))
            .bearer_auth(&self.credentials.access_token)
            .query(&[("page", page), ("per_page", PER_PAGE)]);
        let response = send(ImportSource::Esa, request).await?;
        let response: EsaPostsResponse = read_json(ImportSource::Esa, response).await?;

        let posts = response
            .posts
            .into_iter()
            .map(|post| ImportedPost {
                category: post.category.unwrap_or_default(),
                title: post.name,
                body: post.body_md,
            })
            .collect();
        Ok((posts, response.next_page))
    }
}

// ============================================================================
// Qiita:Team
// ============================================================================

#[derive(Debug, Deserialize)]
struct QiitaItem {
    title: String,
    #[serde(default)]
    body: String,
}

pub struct QiitaClient {
    client: Client,
    base_url: String,
    credentials: ImporterCredentials,
}

impl QiitaClient {
    /// `base_url` may contain `{team}`, replaced with the team name.
    pub fn new(client: Client, base_url: &str, credentials: ImporterCredentials) -> Self {
        let base_url = base_url
            .replace("{team}", &credentials.team_name)
            .trim_end_matches('/')
            .to_string();
        Self {
            client,
            base_url,
            credentials,
        }
    }
}

#[async_trait]
impl ImportSourceClient for QiitaClient {
    fn source(&self) -> ImportSource {
        ImportSource::Qiita
    }

    async fn test_connection(&self) -> Result<(), ImportError> {
        let request = self
            .client
            .get(format!("{}/api/v2/authenticated_user", self.base_url))
            .bearer_auth(&self.credentials.access_token);
        send(ImportSource::Qiita, request).await?;
        Ok(())
    }

    async fn fetch_posts(
        &self,
        page: u32,
    ) -> Result<(Vec<ImportedPost>, Option<u32>), ImportError> {
        let request = self
            .client
            .get(format!("{}/api/v2/items", self.base_url))
            .bearer_auth(&self.credentials.access_token)
            .query(&[("page", page), ("per_page", PER_PAGE)]);
        let items: Vec<QiitaItem> =
            read_json(ImportSource::Qiita, send(ImportSource::Qiita, request).await?).await?;

        let next = (items.len() as u32 >= PER_PAGE).then_some(page + 1);
        let posts = items
            .into_iter()
            .map(|item| ImportedPost {
                category: String::new(),
                title: item.title,
                body: item.body,
            })
            .collect();
        Ok((posts, next))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Configured importer clients, rebuilt whenever importer settings change.
pub struct ImporterRegistry {
    http: Client,
    config: ImporterConfig,
    clients: RwLock<HashMap<ImportSource, Arc<dyn ImportSourceClient>>>,
}

impl ImporterRegistry {
    pub fn new(config: &ImporterConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
            clients: RwLock::new(HashMap::new()),
        })
    }

    pub async fn client(
        &self,
        source: ImportSource,
    ) -> Result<Arc<dyn ImportSourceClient>, ImportError> {
        self.clients
            .read()
            .await
            .get(&source)
            .cloned()
            .ok_or(ImportError::NotConfigured(source))
    }

    /// Rebuilds the client of `source` from the `crowi` namespace. The client
    /// is dropped when credentials are incomplete.
    pub async fn reinitialize(&self, source: ImportSource, config: &ConfigSnapshot) {
        let client = credentials_from(source, config).map(|credentials| {
            let client: Arc<dyn ImportSourceClient> = match source {
                ImportSource::Esa => Arc::new(EsaClient::new(
                    self.http.clone(),
                    &self.config.esa_api_base_url,
                    credentials,
                )),
                ImportSource::Qiita => Arc::new(QiitaClient::new(
                    self.http.clone(),
                    &self.config.qiita_api_base_url,
                    credentials,
                )),
            };
            client
        });

        let mut clients = self.clients.write().await;
        match client {
            Some(client) => {
                info!(source = %source, "Importer client initialized");
                clients.insert(source, client);
            }
            None => {
                clients.remove(&source);
            }
        }
    }

    pub async fn initialize_all(&self, config: &ConfigSnapshot) {
        for source in [ImportSource::Esa, ImportSource::Qiita] {
            self.reinitialize(source, config).await;
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

    fn credentials() -> ImporterCredentials {
        ImporterCredentials {
            team_name: "acme".to_string(),
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn test_credentials_require_both_values() {
        let config = snapshot(&[("importer:esa:team_name", json!("acme"))]);
        assert!(credentials_from(ImportSource::Esa, &config).is_none());

        let config = snapshot(&[
            ("importer:esa:team_name", json!("acme")),
            ("importer:esa:access_token", json!("token")),
        ]);
        assert_eq!(credentials_from(ImportSource::Esa, &config), Some(credentials()));
    }

    #[test]
    fn test_qiita_base_url_substitutes_team() {
        let client = QiitaClient::new(Client::new(), "https://{team}.qiita.com/", credentials());
        assert_eq!(client.base_url, "https://acme.qiita.com");
    }

    #[test]
    fn test_esa_response_parsing() {
        let response: EsaPostsResponse = serde_json::from_value(json!({
            "posts": [{ "name": "Weekly", "body_md": "# notes", "category": "dev/meetings" }],
            "next_page": 2
        }))
        .unwrap();
        assert_eq!(response.posts[0].name, "Weekly");
        assert_eq!(response.next_page, Some(2));
    }

    #[tokio::test]
    async fn test_registry_reinitialize() {
        let registry = ImporterRegistry::new(&ImporterConfig::default()).unwrap();
        assert!(matches!(
            registry.client(ImportSource::Qiita).await,
            Err(ImportError::NotConfigured(ImportSource::Qiita))
        ));

        let config = snapshot(&[
            ("importer:qiita:team_name", json!("acme")),
            ("importer:qiita:access_token", json!("token")),
        ]);
        registry.initialize_all(&config).await;
        let client = registry.client(ImportSource::Qiita).await.unwrap();
        assert_eq!(client.source(), ImportSource::Qiita);
        assert!(registry.client(ImportSource::Esa).await.is_err());

        registry.reinitialize(ImportSource::Qiita, &ConfigSnapshot::new()).await;
        assert!(registry.client(ImportSource::Qiita).await.is_err());
    }
}
