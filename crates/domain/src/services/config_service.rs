//! Namespace-keyed configuration with a process-wide read-through cache.
//!
//! Writes go through [`ConfigService::commit`], which persists the changes in
//! one store call and replaces the cached snapshot with what the store
//! returned, so subsequent reads in this process observe the new values.
//! Concurrent commits to the same namespace are last-writer-wins.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use super::store::StoreError;
use crate::models::config::{ConfigNamespace, ConfigSnapshot};

/// Persistence seam for configuration namespaces.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Loads every key of a namespace.
    async fn load_namespace(&self, ns: ConfigNamespace) -> Result<ConfigSnapshot, StoreError>;

    /// Upserts `changes` atomically and returns the whole namespace after the
    /// write. Keys not present in `changes` are left untouched.
    async fn upsert_namespace(
        &self,
        ns: ConfigNamespace,
        changes: &ConfigSnapshot,
    ) -> Result<ConfigSnapshot, StoreError>;
}

pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    cache: RwLock<HashMap<ConfigNamespace, ConfigSnapshot>>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Loads all namespaces into the cache.
    pub async fn preload(&self) -> Result<(), StoreError> {
        for ns in ConfigNamespace::ALL {
            self.refresh(ns).await?;
        }
        tracing::info!("Configuration namespaces loaded");
        Ok(())
    }

    /// Returns the namespace snapshot, loading it on first access.
    pub async fn get(&self, ns: ConfigNamespace) -> Result<ConfigSnapshot, StoreError> {
        if let Some(snapshot) = self.cache.read().await.get(&ns) {
            return Ok(snapshot.clone());
        }
        self.refresh(ns).await
    }

    /// Re-reads a namespace from the store.
    pub async fn refresh(&self, ns: ConfigNamespace) -> Result<ConfigSnapshot, StoreError> {
        let snapshot = self.store.load_namespace(ns).await?;
        self.cache.write().await.insert(ns, snapshot.clone());
        Ok(snapshot)
    }

    /// Persists `changes` and returns the new namespace snapshot.
    ///
    /// On store failure the cache is left as it was.
    pub async fn commit(
        &self,
        ns: ConfigNamespace,
        changes: ConfigSnapshot,
    ) -> Result<ConfigSnapshot, StoreError> {
        let keys = changes.len();
        let snapshot = self.store.upsert_namespace(ns, &changes).await?;
        self.cache.write().await.insert(ns, snapshot.clone());

        tracing::info!(namespace = %ns, keys = keys, "Configuration committed");
        Ok(snapshot)
    }
}

/// In-memory [`ConfigStore`] for tests and local tooling.
#[derive(Default)]
pub struct InMemoryConfigStore {
    namespaces: Mutex<HashMap<ConfigNamespace, ConfigSnapshot>>,
    fail_writes: AtomicBool,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail until switched back.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConfigNamespace, ConfigSnapshot>> {
        self.namespaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn load_namespace(&self, ns: ConfigNamespace) -> Result<ConfigSnapshot, StoreError> {
        Ok(self.lock().get(&ns).cloned().unwrap_or_default())
    }

    async fn upsert_namespace(
        &self,
        ns: ConfigNamespace,
        changes: &ConfigSnapshot,
    ) -> Result<ConfigSnapshot, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("simulated write failure".to_string()));
        }
        let mut namespaces = self.lock();
        let snapshot = namespaces.entry(ns).or_default();
        for (key, value) in changes {
            snapshot.insert(key.clone(), value.clone());
        }
        Ok(snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn changes(pairs: &[(&str, serde_json::Value)]) -> ConfigSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_commit_is_visible_to_subsequent_reads() {
        let service = ConfigService::new(Arc::new(InMemoryConfigStore::new()));
        assert!(service.get(ConfigNamespace::Markdown).await.unwrap().is_empty());

        service
            .commit(
                ConfigNamespace::Markdown,
                changes(&[("markdown:isEnabledLinebreaks", json!(true))]),
            )
            .await
            .unwrap();

        let snapshot = service.get(ConfigNamespace::Markdown).await.unwrap();
        assert_eq!(snapshot["markdown:isEnabledLinebreaks"], json!(true));
    }

    #[tokio::test]
    async fn test_commit_merges_with_existing_keys() {
        let service = ConfigService::new(Arc::new(InMemoryConfigStore::new()));
        service
            .commit(ConfigNamespace::Crowi, changes(&[("app:title", json!("Wiki"))]))
            .await
            .unwrap();
        let snapshot = service
            .commit(
                ConfigNamespace::Crowi,
                changes(&[("app:confidential", json!("internal"))]),
            )
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["app:title"], json!("Wiki"));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_cache_untouched() {
        let store = Arc::new(InMemoryConfigStore::new());
        let service = ConfigService::new(store.clone());
        service
            .commit(ConfigNamespace::Crowi, changes(&[("app:title", json!("Wiki"))]))
            .await
            .unwrap();

        store.set_fail_writes(true);
        let result = service
            .commit(ConfigNamespace::Crowi, changes(&[("app:title", json!("Other"))]))
            .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
        let snapshot = service.get(ConfigNamespace::Crowi).await.unwrap();
        assert_eq!(snapshot["app:title"], json!("Wiki"));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let service = ConfigService::new(Arc::new(InMemoryConfigStore::new()));
        service
            .commit(
                ConfigNamespace::Notification,
                changes(&[("slack:token", json!("xoxb"))]),
            )
            .await
            .unwrap();
        service.preload().await.unwrap();

        assert!(service.get(ConfigNamespace::Crowi).await.unwrap().is_empty());
        assert_eq!(
            service.get(ConfigNamespace::Notification).await.unwrap()["slack:token"],
            json!("xoxb")
        );
    }
}
