//! Shared domain models crossing the API boundary

pub mod cart;
pub mod order;
pub mod shipping;

pub use cart::{CartItemInput, CustomizationChoice, PartKind, PricedCart, PricedItem, PricedItemKind};
pub use order::{OrderStatus, OrderSummary, PaymentMethod, WorkflowStep};
pub use shipping::{PickupPoint, ShippingOffer};
