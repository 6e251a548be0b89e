//! Cart Repository
//!
//! One cart per user, addressed structurally as `cart:<user_id>`.

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Cart, CartItem};

#[derive(Clone)]
pub struct CartRepository {
    base: BaseRepository,
}

impl CartRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find(&self, user: &str) -> RepoResult<Option<Cart>> {
        let cart: Option<Cart> = self.base.db().select(Cart::record_id(user)).await?;
        Ok(cart)
    }

    /// The user's cart, or a fresh unpersisted one
    pub async fn find_or_new(&self, user: &str) -> RepoResult<Cart> {
        Ok(self.find(user).await?.unwrap_or_else(|| Cart {
            id: None,
            user: user.to_string(),
            items: vec![],
            draft_order: None,
            updated_at: Utc::now().to_rfc3339(),
        }))
    }

    /// Upsert the cart under its structural id
    pub async fn save(&self, user: &str, mut cart: Cart) -> RepoResult<Cart> {
        cart.id = None;
        cart.user = user.to_string();
        cart.updated_at = Utc::now().to_rfc3339();
        let saved: Option<Cart> = self
            .base
            .db()
            .upsert(Cart::record_id(user))
            .content(cart)
            .await?;
        saved.ok_or_else(|| RepoError::Database("Failed to save cart".to_string()))
    }

    pub async fn add_item(&self, user: &str, item: CartItem) -> RepoResult<Cart> {
        let mut cart = self.find_or_new(user).await?;
        cart.items.push(item);
        self.save(user, cart).await
    }

    pub async fn update_quantity(&self, user: &str, index: usize, quantity: i32) -> RepoResult<Cart> {
        let mut cart = self.find_or_new(user).await?;
        match cart.items.get_mut(index) {
            Some(item) => item.set_quantity(quantity),
            None => {
                return Err(RepoError::NotFound(format!(
                    "Cart line {index} does not exist"
                )));
            }
        }
        self.save(user, cart).await
    }

    pub async fn remove_item(&self, user: &str, index: usize) -> RepoResult<Cart> {
        let mut cart = self.find_or_new(user).await?;
        if index >= cart.items.len() {
            return Err(RepoError::NotFound(format!(
                "Cart line {index} does not exist"
            )));
        }
        cart.items.remove(index);
        self.save(user, cart).await
    }

    /// Destroy the cart (successful checkout or explicit emptying)
    pub async fn delete(&self, user: &str) -> RepoResult<()> {
        let _: Option<Cart> = self.base.db().delete(Cart::record_id(user)).await?;
        Ok(())
    }

    /// Link the cart to the draft order backing a payment session
    pub async fn set_draft(&self, user: &str, draft_order: RecordId) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $cart SET draft_order = $draft")
            .bind(("cart", Cart::record_id(user)))
            .bind(("draft", draft_order))
            .await?
            .check()?;
        Ok(())
    }

    pub async fn clear_draft(&self, user: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $cart SET draft_order = NONE")
            .bind(("cart", Cart::record_id(user)))
            .await?
            .check()?;
        Ok(())
    }
}
