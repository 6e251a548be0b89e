//! Shared types for the Atelier storefront
//!
//! 前后端共享的类型定义：购物车输入、计价快照、下单请求/结果、
//! 订单状态机枚举和对外错误码。
//!
//! 服务端持久化实体不在这里, 见 `shop-server/src/db/models`。

pub mod checkout;
pub mod error;
pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use checkout::{Address, CheckoutInput, CheckoutOutcome, CheckoutQuote, ShippingSelection};
pub use error::CheckoutErrorCode;
pub use models::order::{OrderStatus, PaymentMethod, WorkflowStep};
