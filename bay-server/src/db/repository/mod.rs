//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.

// Identity
pub mod shop;
pub mod user;

// Work
pub mod counter;
pub mod job;

// Incentives
pub mod incentive_rule;

// Re-exports
pub use counter::CounterRepository;
pub use incentive_rule::IncentiveRuleRepository;
pub use job::JobRepository;
pub use shop::ShopRepository;
pub use user::UserRepository;

use shared::{AppError, ErrorCode};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// 条件更新未命中 (记录已被并发修改)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        // 唯一索引冲突
        if message.contains("already contains") {
            RepoError::Duplicate(message)
        } else {
            RepoError::Database(message)
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Conflict(msg) => AppError::invalid_state(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "job:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("job", "abc");
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId
//
// 引用字段 (job.shop, user.shop ...) 以 "table:id" 字符串存储，
// 查询时绑定 `id.to_string()`。

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// 解析 "table:id" 或纯 id，并确认表名
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<surrealdb::RecordId> {
    let record: surrealdb::RecordId = if id.contains(':') {
        id.parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?
    } else {
        surrealdb::RecordId::from_table_key(table, id)
    };
    if record.table() != table {
        return Err(RepoError::Validation(format!(
            "Invalid ID: {} is not a {} record",
            id, table
        )));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_id() {
        let id = parse_record_id("job", "job:abc").unwrap();
        assert_eq!(id.to_string(), "job:abc");

        let id = parse_record_id("job", "abc").unwrap();
        assert_eq!(id.table(), "job");

        assert!(matches!(
            parse_record_id("job", "user:abc"),
            Err(RepoError::Validation(_))
        ));
    }

    #[test]
    fn test_conflict_maps_to_invalid_state() {
        let err: AppError = RepoError::Conflict("job:1".into()).into();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let err: AppError = RepoError::Database("down".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}
