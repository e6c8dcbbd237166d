//! Configuration repository.

use async_trait::async_trait;
use domain::models::{ConfigNamespace, ConfigSnapshot};
use domain::services::{ConfigStore, StoreError};
use sqlx::PgPool;

use crate::entities::ConfigEntity;
use crate::error::to_store_error;
use crate::metrics::QueryTimer;

/// Repository for namespaced configuration rows.
#[derive(Clone)]
pub struct ConfigRepository {
    pool: PgPool,
}

impl ConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists every row of a namespace ordered by key.
    pub async fn find_by_namespace(&self, ns: &str) -> Result<Vec<ConfigEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_configs_by_namespace");
        let result = sqlx::query_as::<_, ConfigEntity>(
            r#"
            SELECT ns, key, value
            FROM configs
            WHERE ns = $1
            ORDER BY key
            "#,
        )
        .bind(ns)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Upserts all entries in one transaction and returns the namespace
    /// after the write.
    pub async fn upsert_many(
        &self,
        ns: &str,
        entries: &ConfigSnapshot,
    ) -> Result<Vec<ConfigEntity>, sqlx::Error> {
        let timer = QueryTimer::new("upsert_configs");
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO configs (ns, key, value)
                VALUES ($1, $2, $3)
                ON CONFLICT (ns, key)
                DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                "#,
            )
            .bind(ns)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        let rows = sqlx::query_as::<_, ConfigEntity>(
            r#"
            SELECT ns, key, value
            FROM configs
            WHERE ns = $1
            ORDER BY key
            "#,
        )
        .bind(ns)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(rows)
    }
}

fn to_snapshot(rows: Vec<ConfigEntity>) -> ConfigSnapshot {
    rows.into_iter().map(ConfigEntity::into_pair).collect()
}

#[async_trait]
impl ConfigStore for ConfigRepository {
    async fn load_namespace(&self, ns: ConfigNamespace) -> Result<ConfigSnapshot, StoreError> {
        self.find_by_namespace(ns.as_str())
            .await
            .map(to_snapshot)
            .map_err(to_store_error)
    }

    async fn upsert_namespace(
        &self,
        ns: ConfigNamespace,
        changes: &ConfigSnapshot,
    ) -> Result<ConfigSnapshot, StoreError> {
        self.upsert_many(ns.as_str(), changes)
            .await
            .map(to_snapshot)
            .map_err(to_store_error)
    }
}
