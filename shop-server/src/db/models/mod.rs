//! Persisted entities (SurrealDB documents)

pub mod cart;
pub mod catalog;
pub mod gift_card;
pub mod order;
pub mod promotion_code;
pub mod serde_helpers;

pub use cart::{Cart, CartItem};
pub use catalog::{Article, ArticlePart, EmbroideryColor, Fabric, Piping, StockSku};
pub use gift_card::{GiftCard, GIFT_CARD_VALIDITY_DAYS};
pub use order::{
    BillingInfo, Customer, Order, OrderExtras, OrderItem, OrderTotals, PromotionSnapshot,
    ResolvedChoice, ShippingLine,
};
pub use promotion_code::{Discount, PromotionCode};
