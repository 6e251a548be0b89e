//! Database Module
//!
//! Embedded SurrealDB (RocksDB engine). Cross-entity consistency relies on
//! multi-statement transactions issued by the repositories; there is no
//! row/document locking anywhere.

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::utils::AppError;

const NAMESPACE: &str = "atelier";
const DATABASE: &str = "shop";

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the on-disk database and apply schema definitions
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {e}")))?;
        Self::prepare(&db).await?;
        tracing::info!(path = db_path, "Database connection established (SurrealDB/RocksDB)");
        Ok(Self { db })
    }

    /// In-memory database, used by tests
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {e}")))?;
        Self::prepare(&db).await?;
        Ok(Self { db })
    }

    async fn prepare(db: &Surreal<Db>) -> Result<(), AppError> {
        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::Database(format!("Failed to select namespace: {e}")))?;

        // Uniqueness the commerce core depends on: one order per reference,
        // one promotion/gift-card record per code
        db.query(
            r#"
            DEFINE INDEX IF NOT EXISTS uniq_order_reference ON TABLE order COLUMNS reference UNIQUE;
            DEFINE INDEX IF NOT EXISTS uniq_promotion_code ON TABLE promotion_code COLUMNS code UNIQUE;
            DEFINE INDEX IF NOT EXISTS uniq_gift_card_code ON TABLE gift_card COLUMNS code UNIQUE;
            "#,
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to apply schema definitions: {e}")))?
        .check()
        .map_err(|e| AppError::Database(format!("Schema definition rejected: {e}")))?;

        Ok(())
    }
}
