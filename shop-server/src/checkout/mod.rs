//! Cart → Order conversion and the payment state machine
//!
//! - [`promotion`] - promotion code evaluation (pure, never touches `used`)
//! - [`gift_cards`] - sequential balance allocation
//! - [`assembly`] - the central pure computation producing a priced Order
//! - [`lifecycle`] - draft creation, the three payment paths, webhooks,
//!   post-paid side effects
//! - [`guard`] - draft/stock consistency guard run before cart mutations

pub mod assembly;
pub mod gift_cards;
pub mod guard;
pub mod lifecycle;
pub mod promotion;

use shared::error::CheckoutErrorCode;
use thiserror::Error;

use crate::db::repository::RepoError;
use crate::services::ServiceError;
use crate::utils::AppError;

/// Error taxonomy of the commerce core
///
/// `Rejected` is a validation failure surfaced to the caller with nothing
/// persisted. `Conflict` is an order not being in the expected state
/// (webhook replays land here). `Dependency` is a collaborator failing
/// before anything durable happened. `Integrity` is fatal for the
/// operation (reference collision, un-atomic stock update).
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout rejected: {0}")]
    Rejected(CheckoutErrorCode),

    #[error("order state conflict: {0}")]
    Conflict(String),

    #[error("dependency failure: {0}")]
    Dependency(String),

    #[error("integrity failure: {0}")]
    Integrity(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<CheckoutErrorCode> for CheckoutError {
    fn from(code: CheckoutErrorCode) -> Self {
        Self::Rejected(code)
    }
}

impl From<RepoError> for CheckoutError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => Self::Conflict(msg),
            RepoError::Conflict(msg) => Self::Conflict(msg),
            RepoError::StockConflict => Self::Rejected(CheckoutErrorCode::StockConflict),
            RepoError::Duplicate(msg) | RepoError::Validation(msg) => Self::Integrity(msg),
            RepoError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<ServiceError> for CheckoutError {
    fn from(err: ServiceError) -> Self {
        Self::Dependency(err.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(code) => AppError::BusinessRule(code.as_str().to_string()),
            CheckoutError::Conflict(msg) => AppError::Conflict(msg),
            CheckoutError::Dependency(msg) => {
                tracing::error!(error = %msg, "Checkout dependency failure");
                AppError::Internal(msg)
            }
            CheckoutError::Integrity(msg) => {
                tracing::error!(error = %msg, "Checkout integrity failure");
                AppError::Internal(msg)
            }
            CheckoutError::Database(msg) => AppError::Database(msg),
        }
    }
}
