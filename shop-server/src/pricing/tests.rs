use super::*;
use surrealdb::RecordId;

fn vat20() -> VatRate {
    VatRate::new(20.0)
}

fn article(key: &str, price: f64, min_qty: i32, enabled: bool) -> Article {
    Article {
        id: Some(RecordId::from_table_key("article", key)),
        name: format!("Article {key}"),
        description: None,
        price,
        weight_grams: 250,
        minimum_quantity: min_qty,
        enabled,
        image: None,
        parts: vec![],
        lead_time_days: 21,
    }
}

fn sku(key: &str, price: f64, stock: i64, enabled: bool) -> StockSku {
    StockSku {
        id: Some(RecordId::from_table_key("stock_sku", key)),
        name: format!("Sku {key}"),
        description: None,
        price,
        weight_grams: 100,
        stock,
        enabled,
        image: None,
    }
}

fn customized_item(key: &str, quantity: i32) -> CartItem {
    CartItem::Customized {
        article: RecordId::from_table_key("article", key),
        quantity,
        choices: vec![],
        preview_image: None,
    }
}

fn in_stock_item(key: &str, quantity: i32) -> CartItem {
    CartItem::InStock {
        sku: RecordId::from_table_key("stock_sku", key),
        quantity,
    }
}

fn snapshot_with(articles: Vec<Article>, skus: Vec<StockSku>) -> CatalogSnapshot {
    let mut snap = CatalogSnapshot::default();
    for a in articles {
        let key = a.id.as_ref().unwrap().to_string();
        snap.articles.insert(key, a);
    }
    for s in skus {
        let key = s.id.as_ref().unwrap().to_string();
        snap.skus.insert(key, s);
    }
    snap
}

#[test]
fn test_price_simple_customized_line() {
    let snap = snapshot_with(vec![article("bib", 29.9, 1, true)], vec![]);
    let cart = vec![customized_item("bib", 2)];

    let priced = price_cart(&cart, &snap, vat20());

    assert_eq!(priced.items.len(), 1);
    assert_eq!(priced.items[0].quantity, 2);
    assert_eq!(priced.items[0].unit_price, 29.9);
    assert_eq!(priced.items[0].line_total, 59.8);
    // 59.80 × 20/120 = 9.9666… → 9.97
    assert_eq!(priced.items[0].tax, 9.97);
    assert_eq!(priced.items[0].weight_grams, 500);
    assert_eq!(priced.sub_total_tax_included, 59.8);
    assert_eq!(priced.taxes.get("20"), Some(&9.97));
}

#[test]
fn test_quantity_raised_to_article_minimum() {
    let snap = snapshot_with(vec![article("labels", 1.5, 10, true)], vec![]);
    let cart = vec![customized_item("labels", 3)];

    let priced = price_cart(&cart, &snap, vat20());

    assert_eq!(priced.items[0].quantity, 10);
    assert_eq!(priced.items[0].line_total, 15.0);
}

#[test]
fn test_in_stock_quantity_clamped_to_stock() {
    let snap = snapshot_with(vec![], vec![sku("pouch", 12.0, 2, true)]);
    let cart = vec![in_stock_item("pouch", 5)];

    let priced = price_cart(&cart, &snap, vat20());

    assert_eq!(priced.items[0].quantity, 2);
    assert_eq!(priced.items[0].line_total, 24.0);
}

#[test]
fn test_out_of_stock_line_dropped() {
    let snap = snapshot_with(vec![], vec![sku("pouch", 12.0, 0, true)]);
    let cart = vec![in_stock_item("pouch", 1)];

    let priced = price_cart(&cart, &snap, vat20());

    assert!(priced.is_empty());
    assert_eq!(priced.sub_total_tax_included, 0.0);
}

#[test]
fn test_vanished_and_disabled_references_dropped_silently() {
    let snap = snapshot_with(
        vec![article("off", 10.0, 1, false)],
        vec![sku("gone", 5.0, 3, false)],
    );
    let cart = vec![
        customized_item("off", 1),
        customized_item("missing", 1),
        in_stock_item("gone", 1),
    ];

    let priced = price_cart(&cart, &snap, vat20());

    assert!(priced.is_empty());
    // The stored cart is untouched: dropping happens in the projection only
    assert_eq!(cart.len(), 3);
}

#[test]
fn test_gift_card_line_face_value_no_tax_no_weight() {
    let snap = CatalogSnapshot::default();
    let cart = vec![CartItem::GiftCard {
        amount: 50.0,
        recipient_email: "ada@example.com".to_string(),
        recipient_name: None,
        message: None,
    }];

    let priced = price_cart(&cart, &snap, vat20());

    assert_eq!(priced.items[0].line_total, 50.0);
    assert_eq!(priced.items[0].tax, 0.0);
    assert_eq!(priced.items[0].weight_grams, 0);
    assert!(priced.taxes.is_empty());
    assert_eq!(priced.sub_total_tax_included, 50.0);
    assert_eq!(priced.sub_total_excluding_gift_cards(), 0.0);
}

#[test]
fn test_mixed_cart_aggregates() {
    let snap = snapshot_with(
        vec![article("bib", 29.9, 1, true)],
        vec![sku("pouch", 12.0, 10, true)],
    );
    let cart = vec![
        customized_item("bib", 1),
        in_stock_item("pouch", 2),
        CartItem::GiftCard {
            amount: 30.0,
            recipient_email: "ada@example.com".to_string(),
            recipient_name: None,
            message: None,
        },
    ];

    let priced = price_cart(&cart, &snap, vat20());

    assert_eq!(priced.items.len(), 3);
    // 29.90 + 24.00 + 30.00
    assert_eq!(priced.sub_total_tax_included, 83.9);
    assert_eq!(priced.sub_total_excluding_gift_cards(), 53.9);
    // taxes accumulate per rounded line: 4.98 (29.90) + 4.00 (24.00)
    assert_eq!(priced.taxes.get("20"), Some(&8.98));
    assert_eq!(priced.total_weight_grams, 250 + 200);
    // cart_index survives the projection for later mutations
    assert_eq!(priced.items[1].cart_index, 1);
}
