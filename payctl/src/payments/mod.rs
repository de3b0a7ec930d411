//! Payment processing.
//!
//! A send request moves through validation, settlement, then recording.
//! Only approved payments reach the ledger, always as `completed`; a
//! declined settlement leaves no row behind. The `payment.completed`
//! webhook goes out after the ledger write and never affects the response.

pub mod settlement;
pub mod validation;

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    api::models::{
        transactions::{Currency, SendPaymentRequest, TransactionStatus},
        users::CurrentUser,
    },
    config::Config,
    db::{
        handlers::{Repository, Transactions},
        models::transactions::{TransactionCreateDBRequest, TransactionDBResponse},
    },
    errors::{Error, Result},
    webhooks::{WebhookEvent, WebhookNotifier},
};

pub use settlement::{FixedSettlement, SettlementGateway, SettlementOutcome, SimulatedSettlement, create_gateway};

/// A payment that passed validation and is ready for settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInstruction {
    pub recipient: String,
    pub amount: Decimal,
    pub currency: Currency,
}

pub struct PaymentProcessor {
    db: SqlitePool,
    gateway: Arc<dyn SettlementGateway>,
    notifier: WebhookNotifier,
    max_amount: Decimal,
}

impl std::fmt::Debug for PaymentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentProcessor")
            .field("max_amount", &self.max_amount)
            .field("webhooks_enabled", &self.notifier.is_enabled())
            .finish_non_exhaustive()
    }
}

impl PaymentProcessor {
    pub fn new(db: SqlitePool, gateway: Arc<dyn SettlementGateway>, notifier: WebhookNotifier, max_amount: Decimal) -> Self {
        Self {
            db,
            gateway,
            notifier,
            max_amount,
        }
    }

    /// Wire up a processor from configuration.
    pub fn from_config(db: SqlitePool, config: &Config) -> anyhow::Result<Self> {
        let notifier = WebhookNotifier::new(&config.webhook)?;
        if notifier.is_enabled() {
            info!("Payment webhooks enabled");
        }
        Ok(Self::new(
            db,
            create_gateway(&config.payments.settlement),
            notifier,
            config.payments.max_amount,
        ))
    }

    /// Validate, settle and record a payment on behalf of `user`.
    #[instrument(skip_all, fields(user_id = user.id), err)]
    pub async fn submit(&self, user: &CurrentUser, request: &SendPaymentRequest) -> Result<TransactionDBResponse> {
        let payment = validation::validate(request, self.max_amount)?;

        let outcome = self.gateway.settle(&payment).await.map_err(|e| Error::Internal {
            operation: format!("settle payment: {e}"),
        })?;
        metrics::counter!("payctl_payments_total", "outcome" => outcome.as_str()).increment(1);

        if outcome == SettlementOutcome::Declined {
            warn!(amount = %payment.amount, currency = %payment.currency, "Payment declined by settlement");
            return Err(Error::PaymentFailed);
        }

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let transaction = Transactions::new(&mut conn)
            .create(&TransactionCreateDBRequest {
                user_id: user.id,
                recipient: payment.recipient,
                amount: payment.amount,
                currency: payment.currency,
                status: TransactionStatus::Completed,
            })
            .await?;

        info!(
            transaction_id = transaction.id,
            amount = %transaction.amount,
            currency = %transaction.currency,
            "Payment recorded"
        );

        self.notifier
            .dispatch(WebhookEvent::payment_completed(&transaction, self.notifier.source()));

        Ok(transaction)
    }
}
