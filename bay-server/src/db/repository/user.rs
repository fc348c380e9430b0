//! User Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{EfficiencySnapshot, User};
use serde_json::Value;
use shared::models::{MembershipStatus, Role};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by id
    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<User>> {
        let user: Option<User> = self.base.db().select(id.clone()).await?;
        Ok(user)
    }

    /// Find user by (normalized) email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Technicians of a shop with the given membership status
    pub async fn find_technicians(
        &self,
        shop: &RecordId,
        status: MembershipStatus,
    ) -> RepoResult<Vec<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query(
                "SELECT * FROM user WHERE shop = $shop AND role = $role \
                 AND membership_status = $status ORDER BY created_at",
            )
            .bind(("shop", shop.to_string()))
            .bind(("role", Role::Technician))
            .bind(("status", status))
            .await?
            .take(0)?;
        Ok(users)
    }

    /// Create a new user
    pub async fn create(&self, user: User) -> RepoResult<User> {
        if self.find_by_email(&user.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already registered",
                user.email
            )));
        }

        let mut data = user;
        data.id = None;
        let created: Option<User> = self.base.db().create(TABLE).content(data).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Partial update (MERGE)
    pub async fn merge(&self, id: &RecordId, patch: Value) -> RepoResult<User> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("data", patch))
            .await?;

        result
            .take::<Option<User>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("User {} not found", id)))
    }

    /// Partial update that only applies while the membership status is unchanged
    ///
    /// 并发审批时只有第一个写入者成功，其余返回 `Conflict`。
    pub async fn merge_if_status(
        &self,
        id: &RecordId,
        expected: MembershipStatus,
        patch: Value,
    ) -> RepoResult<User> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data WHERE membership_status = $expected RETURN AFTER")
            .bind(("thing", id.clone()))
            .bind(("data", patch))
            .bind(("expected", expected))
            .await?;

        let updated: Vec<User> = result.take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Conflict(format!("User {} changed concurrently", id)))
    }

    /// Archive the week and zero the earnings, provided nothing was earned since `seen`
    pub async fn reset_weekly(
        &self,
        id: &RecordId,
        seen_earnings: f64,
        snapshot: Option<EfficiencySnapshot>,
        now: i64,
    ) -> RepoResult<User> {
        let archive = if snapshot.is_some() {
            "efficiency_history += $snapshot,"
        } else {
            ""
        };
        let sql = format!(
            "UPDATE $thing SET {archive} weekly_earnings = 0.0, week_started_at = $now, \
             updated_at = $now WHERE weekly_earnings = $seen RETURN AFTER"
        );

        let mut result = self
            .base
            .db()
            .query(sql)
            .bind(("thing", id.clone()))
            .bind(("snapshot", snapshot))
            .bind(("seen", seen_earnings))
            .bind(("now", now))
            .await?;

        let updated: Vec<User> = result.take(0)?;
        updated.into_iter().next().ok_or_else(|| {
            RepoError::Conflict(format!("Earnings of user {} changed during reset", id))
        })
    }

    /// Delete a user (used to roll back a failed signup)
    pub async fn delete(&self, id: &RecordId) -> RepoResult<()> {
        let _: Option<User> = self.base.db().delete(id.clone()).await?;
        Ok(())
    }
}
