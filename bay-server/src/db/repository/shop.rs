//! Shop Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::Shop;
use serde_json::Value;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "shop";

#[derive(Clone)]
pub struct ShopRepository {
    base: BaseRepository,
}

impl ShopRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find shop by id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Shop>> {
        let shop: Option<Shop> = self.base.db().select(id.clone()).await?;
        Ok(shop)
    }

    /// Find shop by join code (stored upper-case)
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<Shop>> {
        let code_owned = code.to_uppercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM shop WHERE code = $code LIMIT 1")
            .bind(("code", code_owned))
            .await?;
        let shops: Vec<Shop> = result.take(0)?;
        Ok(shops.into_iter().next())
    }

    /// Find the shop owned by a manager
    pub async fn find_by_manager(&self, manager: &RecordId) -> RepoResult<Option<Shop>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM shop WHERE manager = $manager LIMIT 1")
            .bind(("manager", manager.to_string()))
            .await?;
        let shops: Vec<Shop> = result.take(0)?;
        Ok(shops.into_iter().next())
    }

    /// Whether a code is already taken
    pub async fn code_exists(&self, code: &str) -> RepoResult<bool> {
        Ok(self.find_by_code(code).await?.is_some())
    }

    /// Create a new shop (the unique index rejects a colliding code)
    pub async fn create(&self, shop: Shop) -> RepoResult<Shop> {
        let mut data = shop;
        data.id = None;
        let created: Option<Shop> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create shop".to_string()))
    }

    /// Replace the join code
    pub async fn update_code(&self, id: &RecordId, code: &str) -> RepoResult<Shop> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET code = $code RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("code", code.to_uppercase()))
            .await?;

        result
            .take::<Option<Shop>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Shop {} not found", id)))
    }

    /// Partial update (MERGE)
    pub async fn merge(&self, id: &RecordId, patch: Value) -> RepoResult<Shop> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("data", patch))
            .await?;

        result
            .take::<Option<Shop>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Shop {} not found", id)))
    }

    /// Delete a shop (used to roll back a failed manager signup)
    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let _: Option<Shop> = self.base.db().delete(id.clone()).await?;
        Ok(())
    }
}
