//! Media store collaborator
//!
//! Preview captures uploaded during cart building live under a per-cart
//! prefix. When an order is submitted they are promoted to the order's
//! prefix so they survive cart deletion. Storage mechanics stay behind the
//! trait ("store bytes, get back a URL").

use std::path::PathBuf;

use async_trait::async_trait;

use super::{ServiceError, ServiceResult};

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Move all checkout-time media of a user's cart under the order's
    /// prefix; returns the new relative paths.
    async fn promote_cart_media(
        &self,
        user: &str,
        order_reference: i64,
    ) -> ServiceResult<Vec<String>>;
}

/// Filesystem media store rooted at `<work_dir>/media`
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn cart_dir(&self, user: &str) -> PathBuf {
        self.root.join("cart").join(user)
    }

    fn order_dir(&self, order_reference: i64) -> PathBuf {
        self.root.join("orders").join(order_reference.to_string())
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn promote_cart_media(
        &self,
        user: &str,
        order_reference: i64,
    ) -> ServiceResult<Vec<String>> {
        let cart_dir = self.cart_dir(user);
        if !cart_dir.exists() {
            return Ok(vec![]);
        }
        let order_dir = self.order_dir(order_reference);
        tokio::fs::create_dir_all(&order_dir)
            .await
            .map_err(|e| ServiceError::Rejected("media", e.to_string()))?;

        let mut moved = Vec::new();
        let mut entries = tokio::fs::read_dir(&cart_dir)
            .await
            .map_err(|e| ServiceError::Rejected("media", e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ServiceError::Rejected("media", e.to_string()))?
        {
            let file_name = entry.file_name();
            let target = order_dir.join(&file_name);
            tokio::fs::rename(entry.path(), &target)
                .await
                .map_err(|e| ServiceError::Rejected("media", e.to_string()))?;
            moved.push(format!(
                "orders/{order_reference}/{}",
                file_name.to_string_lossy()
            ));
        }
        // Leftover empty directory is harmless; remove it anyway
        let _ = tokio::fs::remove_dir(&cart_dir).await;

        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_promote_moves_files_to_order_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(tmp.path());
        let cart_dir = tmp.path().join("cart").join("user-1");
        tokio::fs::create_dir_all(&cart_dir).await.unwrap();
        tokio::fs::write(cart_dir.join("preview.png"), b"png")
            .await
            .unwrap();

        let moved = store.promote_cart_media("user-1", 1042).await.unwrap();

        assert_eq!(moved, vec!["orders/1042/preview.png".to_string()]);
        assert!(tmp.path().join("orders/1042/preview.png").exists());
        assert!(!cart_dir.exists());
    }

    #[tokio::test]
    async fn test_promote_with_no_cart_media_is_a_noop() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(tmp.path());
        let moved = store.promote_cart_media("user-1", 7).await.unwrap();
        assert!(moved.is_empty());
    }
}
