//! Database Module
//!
//! Handles the embedded SurrealDB connection and table definitions

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

/// 内存引擎的路径标记
pub const MEMORY_PATH: &str = "memory";

const NAMESPACE: &str = "bay";
const DATABASE: &str = "main";

/// 启动时声明的索引 (幂等)
const SCHEMA: &str = r#"
DEFINE INDEX IF NOT EXISTS user_email ON TABLE user FIELDS email UNIQUE;
DEFINE INDEX IF NOT EXISTS user_shop ON TABLE user FIELDS shop;
DEFINE INDEX IF NOT EXISTS shop_code ON TABLE shop FIELDS code UNIQUE;
DEFINE INDEX IF NOT EXISTS shop_manager ON TABLE shop FIELDS manager UNIQUE;
DEFINE INDEX IF NOT EXISTS job_service_order ON TABLE job FIELDS service_order_number UNIQUE;
DEFINE INDEX IF NOT EXISTS job_shop ON TABLE job FIELDS shop;
DEFINE INDEX IF NOT EXISTS job_status ON TABLE job FIELDS status;
DEFINE INDEX IF NOT EXISTS job_required_cert ON TABLE job FIELDS required_cert;
DEFINE INDEX IF NOT EXISTS job_assigned_tech ON TABLE job FIELDS assigned_tech;
DEFINE INDEX IF NOT EXISTS incentive_rule_shop ON TABLE incentive_rule FIELDS shop;
"#;

/// Database service, owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the database (`memory` for the in-memory engine, otherwise a RocksDB directory)
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = if db_path == MEMORY_PATH {
            Surreal::new::<Mem>(()).await
        } else {
            Surreal::new::<RocksDb>(db_path).await
        }
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        db.query(SCHEMA)
            .await
            .and_then(|response| response.check())
            .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;

        tracing::info!(path = %db_path, "Database connection established");

        Ok(Self { db })
    }
}
