//! Database models for ledger entries.

use crate::api::models::transactions::{Currency, TransactionStatus};
use crate::types::{TransactionId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Database request for recording a payment
#[derive(Debug, Clone)]
pub struct TransactionCreateDBRequest {
    pub user_id: UserId,
    pub recipient: String,
    /// At most two decimal places; stored as integer minor units
    pub amount: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
}

/// Database response for a ledger entry
#[derive(Debug, Clone)]
pub struct TransactionDBResponse {
    pub id: TransactionId,
    pub user_id: UserId,
    pub recipient: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}
