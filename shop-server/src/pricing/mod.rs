//! Cart pricing engine
//!
//! Recomputes a persisted cart against live catalog data: current prices and
//! weights, in-stock quantities clamped to available stock, vanished
//! references dropped. Pure projection: the stored cart is never mutated by
//! a read. Callers fetch a [`CatalogSnapshot`] first so pricing itself does
//! no I/O.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use shared::models::cart::{PartKind, PricedCart, PricedItem, PricedItemKind};

use crate::db::models::{Article, CartItem, EmbroideryColor, Fabric, Piping, StockSku};
use crate::money::{to_decimal, to_f64, round2, VatRate};

/// Catalog entities pre-fetched for one cart read, keyed by "table:id"
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    pub articles: HashMap<String, Article>,
    pub skus: HashMap<String, StockSku>,
    pub fabrics: HashMap<String, Fabric>,
    pub pipings: HashMap<String, Piping>,
    pub embroideries: HashMap<String, EmbroideryColor>,
}

impl CatalogSnapshot {
    /// Display name of an enabled customization part, None when the
    /// reference vanished or is disabled
    pub fn part_name(&self, kind: PartKind, reference: &str) -> Option<&str> {
        match kind {
            PartKind::Fabric => self
                .fabrics
                .get(reference)
                .filter(|f| f.enabled)
                .map(|f| f.name.as_str()),
            PartKind::Piping => self
                .pipings
                .get(reference)
                .filter(|p| p.enabled)
                .map(|p| p.name.as_str()),
            PartKind::Embroidery => self
                .embroideries
                .get(reference)
                .filter(|e| e.enabled)
                .map(|e| e.name.as_str()),
        }
    }
}

/// Price every cart line against the snapshot and aggregate totals.
///
/// - `customized` lines: quantity raised to the article minimum
/// - `in_stock` lines: quantity clamped to live stock, dropped at zero
/// - lines whose article/sku vanished or is disabled are dropped from the
///   projection (the stored cart keeps them)
/// - gift cards are face value: no VAT, no weight
pub fn price_cart(items: &[CartItem], catalog: &CatalogSnapshot, vat: VatRate) -> PricedCart {
    let mut priced = Vec::new();
    let mut sub_total = Decimal::ZERO;
    let mut taxes: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut total_weight: i64 = 0;

    for (cart_index, item) in items.iter().enumerate() {
        let line = match item {
            CartItem::Customized {
                article,
                quantity,
                choices,
                preview_image,
            } => {
                let Some(entry) = catalog.articles.get(&article.to_string()) else {
                    continue;
                };
                if !entry.enabled {
                    continue;
                }
                let quantity = (*quantity).max(entry.minimum_quantity).max(1);
                price_line(
                    PricedItemKind::Customized {
                        article: article.to_string(),
                        choices: choices.clone(),
                    },
                    cart_index,
                    entry.name.clone(),
                    preview_image.clone().or_else(|| entry.image.clone()),
                    quantity,
                    entry.price,
                    entry.weight_grams,
                    vat,
                )
            }
            CartItem::InStock { sku, quantity } => {
                let Some(entry) = catalog.skus.get(&sku.to_string()) else {
                    continue;
                };
                if !entry.enabled || entry.stock <= 0 {
                    continue;
                }
                let quantity = (*quantity).min(entry.stock as i32).max(1);
                price_line(
                    PricedItemKind::InStock {
                        sku: sku.to_string(),
                    },
                    cart_index,
                    entry.name.clone(),
                    entry.image.clone(),
                    quantity,
                    entry.price,
                    entry.weight_grams,
                    vat,
                )
            }
            CartItem::GiftCard {
                amount,
                recipient_email,
                recipient_name,
                message,
            } => PricedItem {
                item: PricedItemKind::GiftCard {
                    amount: *amount,
                    recipient_email: recipient_email.clone(),
                    recipient_name: recipient_name.clone(),
                    message: message.clone(),
                },
                cart_index,
                description: "Gift card".to_string(),
                image: None,
                quantity: 1,
                unit_price: to_f64(to_decimal(*amount)),
                line_total: to_f64(to_decimal(*amount)),
                weight_grams: 0,
                tax: 0.0,
            },
        };

        sub_total += to_decimal(line.line_total);
        if line.tax > 0.0 {
            *taxes.entry(vat.bucket_key()).or_insert(Decimal::ZERO) += to_decimal(line.tax);
        }
        total_weight += line.weight_grams;
        priced.push(line);
    }

    PricedCart {
        items: priced,
        sub_total_tax_included: to_f64(sub_total),
        taxes: taxes.into_iter().map(|(k, v)| (k, to_f64(v))).collect(),
        total_weight_grams: total_weight,
    }
}

#[allow(clippy::too_many_arguments)]
fn price_line(
    item: PricedItemKind,
    cart_index: usize,
    description: String,
    image: Option<String>,
    quantity: i32,
    unit_price: f64,
    unit_weight_grams: i64,
    vat: VatRate,
) -> PricedItem {
    let unit = round2(to_decimal(unit_price));
    let line_total = round2(unit * Decimal::from(quantity));
    let tax = vat.tax_in_gross(line_total);

    PricedItem {
        item,
        cart_index,
        description,
        image,
        quantity,
        unit_price: to_f64(unit),
        line_total: to_f64(line_total),
        weight_grams: unit_weight_grams * quantity as i64,
        tax: to_f64(tax),
    }
}

#[cfg(test)]
mod tests;
