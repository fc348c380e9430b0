//! Counter Repository
//!
//! 持久化的单调计数器，每次 `next` 都是一次原子 UPSERT，不依赖进程内状态。

use super::{BaseRepository, RepoError, RepoResult};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Debug, Deserialize)]
struct CounterRecord {
    seq: i64,
}

#[derive(Clone)]
pub struct CounterRepository {
    base: BaseRepository,
}

impl CounterRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Increment and return the next value (first call returns 1)
    pub async fn next(&self, name: &str) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query("UPSERT type::thing('counter', $name) SET seq = (seq OR 0) + 1 RETURN AFTER")
            .bind(("name", name.to_string()))
            .await?;

        let records: Vec<CounterRecord> = result.take(0)?;
        records
            .into_iter()
            .next()
            .map(|r| r.seq)
            .ok_or_else(|| RepoError::Database(format!("Counter {} was not updated", name)))
    }
}
