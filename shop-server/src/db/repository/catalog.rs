//! Catalog Repository
//!
//! Read-side lookups only: the storefront admin maintains these tables
//! through its own CRUD screens, outside this core. The one job here is
//! batching every entity a cart references into a [`CatalogSnapshot`].

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoResult};
use crate::db::models::{Article, CartItem, EmbroideryColor, Fabric, Piping, StockSku};
use crate::pricing::CatalogSnapshot;
use shared::models::cart::PartKind;

#[derive(Clone)]
pub struct CatalogRepository {
    base: BaseRepository,
}

impl CatalogRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_article(&self, id: &RecordId) -> RepoResult<Option<Article>> {
        Ok(self.base.db().select(id.clone()).await?)
    }

    pub async fn find_sku(&self, id: &RecordId) -> RepoResult<Option<StockSku>> {
        Ok(self.base.db().select(id.clone()).await?)
    }

    /// A record addressed by a "table:id" string; a malformed reference
    /// behaves like a vanished one
    async fn select_ref<T: DeserializeOwned>(&self, reference: &str) -> RepoResult<Option<T>> {
        let Ok(id) = reference.parse::<RecordId>() else {
            return Ok(None);
        };
        Ok(self.base.db().select(id).await?)
    }

    /// Fetch everything the cart references: articles, skus and every
    /// customization part. Missing entities are simply absent from the
    /// snapshot; the pricing engine treats absence as "vanished".
    pub async fn snapshot(&self, items: &[CartItem]) -> RepoResult<CatalogSnapshot> {
        let mut article_ids: Vec<RecordId> = Vec::new();
        let mut sku_ids: Vec<RecordId> = Vec::new();
        let mut fabric_refs: Vec<String> = Vec::new();
        let mut piping_refs: Vec<String> = Vec::new();
        let mut embroidery_refs: Vec<String> = Vec::new();

        for item in items {
            match item {
                CartItem::Customized {
                    article, choices, ..
                } => {
                    if !article_ids.contains(article) {
                        article_ids.push(article.clone());
                    }
                    for choice in choices {
                        let bucket = match choice.kind {
                            PartKind::Fabric => &mut fabric_refs,
                            PartKind::Piping => &mut piping_refs,
                            PartKind::Embroidery => &mut embroidery_refs,
                        };
                        if !bucket.contains(&choice.reference) {
                            bucket.push(choice.reference.clone());
                        }
                    }
                }
                CartItem::InStock { sku, .. } => {
                    if !sku_ids.contains(sku) {
                        sku_ids.push(sku.clone());
                    }
                }
                CartItem::GiftCard { .. } => {}
            }
        }

        let mut snapshot = CatalogSnapshot::default();

        let articles = try_join_all(article_ids.iter().map(|id| self.find_article(id))).await?;
        for (id, article) in article_ids.iter().zip(articles) {
            if let Some(article) = article {
                snapshot.articles.insert(id.to_string(), article);
            }
        }

        let skus = try_join_all(sku_ids.iter().map(|id| self.find_sku(id))).await?;
        for (id, sku) in sku_ids.iter().zip(skus) {
            if let Some(sku) = sku {
                snapshot.skus.insert(id.to_string(), sku);
            }
        }

        let fabrics =
            try_join_all(fabric_refs.iter().map(|r| self.select_ref::<Fabric>(r))).await?;
        for (reference, fabric) in fabric_refs.iter().zip(fabrics) {
            if let Some(fabric) = fabric {
                snapshot.fabrics.insert(reference.clone(), fabric);
            }
        }

        let pipings =
            try_join_all(piping_refs.iter().map(|r| self.select_ref::<Piping>(r))).await?;
        for (reference, piping) in piping_refs.iter().zip(pipings) {
            if let Some(piping) = piping {
                snapshot.pipings.insert(reference.clone(), piping);
            }
        }

        let embroideries = try_join_all(
            embroidery_refs
                .iter()
                .map(|r| self.select_ref::<EmbroideryColor>(r)),
        )
        .await?;
        for (reference, color) in embroidery_refs.iter().zip(embroideries) {
            if let Some(color) = color {
                snapshot.embroideries.insert(reference.clone(), color);
            }
        }

        Ok(snapshot)
    }
}
