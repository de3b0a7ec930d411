//! Webhook event types and payload builders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::models::transactions::{Currency, TransactionStatus},
    db::models::transactions::TransactionDBResponse,
    types::{TransactionId, UserId},
};

/// Webhook event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum WebhookEventType {
    /// A payment settled and was written to the ledger
    #[serde(rename = "payment.completed")]
    PaymentCompleted,
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaymentCompleted => write!(f, "payment.completed"),
        }
    }
}

/// Data block of a `payment.completed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCompletedData {
    pub transaction_id: TransactionId,
    pub user_id: UserId,
    pub recipient: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
    /// When the ledger entry was written
    pub timestamp: DateTime<Utc>,
}

impl From<&TransactionDBResponse> for PaymentCompletedData {
    fn from(tx: &TransactionDBResponse) -> Self {
        Self {
            transaction_id: tx.id,
            user_id: tx.user_id,
            recipient: tx.recipient.clone(),
            amount: tx.amount,
            currency: tx.currency,
            status: tx.status,
            timestamp: tx.timestamp,
        }
    }
}

/// Complete webhook event payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebhookEvent {
    pub event: WebhookEventType,
    pub data: PaymentCompletedData,
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
    /// Identifies this service to the receiver
    pub source: String,
}

impl WebhookEvent {
    pub fn payment_completed(tx: &TransactionDBResponse, source: &str) -> Self {
        Self {
            event: WebhookEventType::PaymentCompleted,
            data: PaymentCompletedData::from(tx),
            timestamp: Utc::now(),
            source: source.to_string(),
        }
    }
}
