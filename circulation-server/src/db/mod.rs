//! Database Module
//!
//! 嵌入式 SurrealDB (RocksDB 引擎)。启动时建立连接、选择
//! namespace/database 并应用 schema。

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

/// Schema applied at startup (and by tests against the in-memory engine)
pub const SCHEMA: &str = include_str!("schema.surql");

const NAMESPACE: &str = "library";
const DATABASE: &str = "circulation";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database at `db_path` and bootstrap the schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        apply_schema(&db).await?;

        tracing::info!("Database ready (SurrealDB embedded, path: {})", db_path);

        Ok(Self { db })
    }
}

/// Select namespace/database and apply the schema on an existing connection.
///
/// Split out so integration tests can run it against the kv-mem engine.
pub async fn apply_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

    db.query(SCHEMA)
        .await
        .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?
        .check()
        .map_err(|e| AppError::database(format!("Schema bootstrap failed: {e}")))?;

    Ok(())
}
