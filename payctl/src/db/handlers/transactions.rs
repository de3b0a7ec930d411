//! Database repository for the payment ledger.

use crate::types::{TransactionId, UserId};
use crate::{
    api::models::transactions::{Currency, TransactionStatus},
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::transactions::{TransactionCreateDBRequest, TransactionDBResponse},
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};
use tracing::instrument;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub recipient: String,
    pub amount_cents: i64,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

impl From<Transaction> for TransactionDBResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            recipient: tx.recipient,
            amount: from_minor_units(tx.amount_cents),
            currency: tx.currency,
            status: tx.status,
            timestamp: tx.timestamp,
        }
    }
}

/// Convert a two-decimal amount to integer cents.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    let mut scaled = amount;
    scaled.rescale(2);
    i64::try_from(scaled.mantissa()).map_err(|_| DbError::Other(anyhow::anyhow!("amount {amount} does not fit in minor units")))
}

pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

const SELECT_COLUMNS: &str = "SELECT id, user_id, recipient, amount_cents, currency, status, timestamp FROM transactions";

pub struct Transactions<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Transactions<'c> {
    type CreateRequest = TransactionCreateDBRequest;
    type Response = TransactionDBResponse;
    type Id = TransactionId;

    /// Record one ledger entry in a single INSERT.
    #[instrument(skip(self, request), fields(user_id = request.user_id, currency = %request.currency, status = %request.status), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let amount_cents = to_minor_units(request.amount)?;
        let tx = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (user_id, recipient, amount_cents, currency, status, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, user_id, recipient, amount_cents, currency, status, timestamp
            "#,
        )
        .bind(request.user_id)
        .bind(&request.recipient)
        .bind(amount_cents)
        .bind(request.currency)
        .bind(request.status)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(TransactionDBResponse::from(tx))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let tx = sqlx::query_as::<_, Transaction>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(tx.map(TransactionDBResponse::from))
    }
}

impl<'c> Transactions<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// All entries owned by `user_id`, newest first. Equal timestamps fall back
    /// to insertion order, newest first.
    #[instrument(skip(self), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<TransactionDBResponse>> {
        let rows = sqlx::query_as::<_, Transaction>(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY timestamp DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(TransactionDBResponse::from).collect())
    }
}
