//! Gift Card Repository
//!
//! `consumed_amount` increments happen inside the order transactions, not
//! here. This repository covers lookups, claiming and issuance.

use chrono::Utc;
use rand::Rng;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::GiftCard;

const TABLE: &str = "gift_card";

#[derive(Clone)]
pub struct GiftCardRepository {
    base: BaseRepository,
}

impl GiftCardRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<GiftCard>> {
        Ok(self.base.db().select(id.clone()).await?)
    }

    pub async fn find_by_code(&self, code: &str) -> RepoResult<Option<GiftCard>> {
        let normalized = code.trim().to_uppercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM gift_card WHERE code = $code LIMIT 1")
            .bind(("code", normalized))
            .await?;
        let cards: Vec<GiftCard> = result.take(0)?;
        Ok(cards.into_iter().next())
    }

    pub async fn find_by_owner(&self, user: &str) -> RepoResult<Vec<GiftCard>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM gift_card WHERE owner = $owner ORDER BY created_at")
            .bind(("owner", user.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    /// Attach an unclaimed card to a user. Returns the card, or None when
    /// the card is already claimed by someone else.
    pub async fn claim(&self, card_id: &RecordId, user: &str) -> RepoResult<Option<GiftCard>> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $card SET owner = $user WHERE owner = NONE OR owner = $user RETURN AFTER")
            .bind(("card", card_id.clone()))
            .bind(("user", user.to_string()))
            .await?;
        let cards: Vec<GiftCard> = result.take(0)?;
        Ok(cards.into_iter().next())
    }

    /// Attach every unclaimed card addressed to this email (run at login)
    pub async fn claim_for_email(&self, email: &str, user: &str) -> RepoResult<Vec<GiftCard>> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE gift_card SET owner = $user \
                 WHERE recipient_email = $email AND owner = NONE RETURN AFTER",
            )
            .bind(("email", email.to_string()))
            .bind(("user", user.to_string()))
            .await?;
        Ok(result.take(0)?)
    }

    /// Issue a purchased card to its recipient (on-paid hook)
    pub async fn create(&self, mut card: GiftCard) -> RepoResult<GiftCard> {
        card.id = None;
        if card.created_at.is_empty() {
            card.created_at = Utc::now().to_rfc3339();
        }
        let created: Option<GiftCard> = self.base.db().create(TABLE).content(card).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create gift card".to_string()))
    }
}

/// Generate a claim code ("GC-XXXX-XXXX-XXXX", unambiguous alphabet)
pub fn generate_gift_card_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let mut groups = Vec::with_capacity(3);
    for _ in 0..3 {
        let group: String = (0..4)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        groups.push(group);
    }
    format!("GC-{}", groups.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let code = generate_gift_card_code();
        assert_eq!(code.len(), 17);
        assert!(code.starts_with("GC-"));
        // No ambiguous characters
        assert!(!code.contains('O') && !code.contains('0') && !code.contains('I'));
    }

    #[test]
    fn test_generated_codes_differ() {
        let a = generate_gift_card_code();
        let b = generate_gift_card_code();
        assert_ne!(a, b);
    }
}
