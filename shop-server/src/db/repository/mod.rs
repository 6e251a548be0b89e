//! Repository Module
//!
//! Per-aggregate access to SurrealDB. Order mutations that must be atomic
//! (submission, webhook finalization) are multi-statement transactions built
//! by [`order::OrderRepository`].

pub mod cart;
pub mod catalog;
pub mod gift_card;
pub mod order;
pub mod promotion_code;

// Re-exports
pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use gift_card::GiftCardRepository;
pub use order::{OrderRepository, SubmitEffects};
pub use promotion_code::PromotionCodeRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Markers THROWn inside transactions to abort with a typed outcome
pub const STOCK_CONFLICT_MARKER: &str = "STOCK_CONFLICT";
pub const STATE_CONFLICT_MARKER: &str = "ORDER_STATE_CONFLICT";

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Atomic conditional stock decrement matched zero rows
    #[error("Stock conflict")]
    StockConflict,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // Transactions surface THROWn markers through the generic error path
        if msg.contains(STOCK_CONFLICT_MARKER) {
            RepoError::StockConflict
        } else if msg.contains(STATE_CONFLICT_MARKER) {
            RepoError::Conflict("order not in the expected state".to_string())
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

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
