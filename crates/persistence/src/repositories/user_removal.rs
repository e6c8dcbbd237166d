//! Database-backed steps of the user removal cascade.

use async_trait::async_trait;
use domain::models::User;
use domain::services::{StoreError, UserRemovalSteps};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ExternalAccountRepository, PageRepository, UserRepository};
use crate::error::to_store_error;

/// Runs each removal step against its own repository.
#[derive(Clone)]
pub struct UserRemovalRepository {
    users: UserRepository,
    external_accounts: ExternalAccountRepository,
    pages: PageRepository,
}

impl UserRemovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            external_accounts: ExternalAccountRepository::new(pool.clone()),
            pages: PageRepository::new(pool),
        }
    }
}

#[async_trait]
impl UserRemovalSteps for UserRemovalRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.users
            .find_by_id(id)
            .await
            .map(|user| user.map(Into::into))
            .map_err(to_store_error)
    }

    async fn mark_deleted(&self, user: &User) -> Result<(), StoreError> {
        match self.users.mark_deleted(user.id).await.map_err(to_store_error)? {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }

    async fn remove_external_accounts(&self, user_id: Uuid) -> Result<u64, StoreError> {
        self.external_accounts
            .delete_by_user(user_id)
            .await
            .map_err(to_store_error)
    }

    async fn remove_page_tree(&self, path: &str) -> Result<u64, StoreError> {
        self.pages.delete_tree(path).await.map_err(to_store_error)
    }
}
