//! Promotion Code Repository
//!
//! Lookups only. The `used` counter moves exclusively inside the order
//! submission/finalization transactions (see `order::OrderRepository`).

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoResult};
use crate::db::models::PromotionCode;

#[derive(Clone)]
pub struct PromotionCodeRepository {
    base: BaseRepository,
}

impl PromotionCodeRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Codes are stored uppercase; matching is case-insensitive
    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<PromotionCode>> {
        let normalized = code.trim().to_uppercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM promotion_code WHERE code = $code LIMIT 1")
            .bind(("code", normalized))
            .await?;
        let codes: Vec<PromotionCode> = result.take(0)?;
        Ok(codes.into_iter().next())
    }
}
