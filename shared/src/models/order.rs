//! Order state machine enums and list-view DTOs

use serde::{Deserialize, Serialize};

/// Payment status. PAID is terminal; fulfillment advances on
/// [`WorkflowStep`], an independent axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Provisional order backing an in-progress card payment session.
    /// Never user-visible, deleted when abandoned.
    Draft,
    WaitingBankTransfer,
    Paid,
}

/// Fulfillment sub-state, only meaningful once PAID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStep {
    Production,
    Shipping,
    Delivered,
}

impl WorkflowStep {
    /// The step that follows this one, if any
    pub fn next(&self) -> Option<WorkflowStep> {
        match self {
            Self::Production => Some(Self::Shipping),
            Self::Shipping => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

/// How the order is (to be) paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    /// Fully covered by gift-card balance, no external charge
    GiftCard,
}

/// Order summary for list views (customer history, back office)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub reference: i64,
    pub status: OrderStatus,
    pub workflow_step: WorkflowStep,
    pub total_tax_included: f64,
    pub payment_method: PaymentMethod,
    pub created_at: String,
    pub paid_at: Option<String>,
}
