//! Settlement gateway abstraction.
//!
//! Settlement is where a real payment network would be called. Today the
//! outcome is simulated; the [`SettlementGateway`] trait keeps the processor
//! independent of how the decision is made, and tests plug in
//! [`FixedSettlement`] for deterministic results.

use async_trait::async_trait;
use rand::prelude::RngExt;
use rand::rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SettlementConfig;
use crate::payments::PaymentInstruction;

/// Create a settlement gateway from configuration
pub fn create_gateway(config: &SettlementConfig) -> Arc<dyn SettlementGateway> {
    match config {
        SettlementConfig::Simulated { success_rate } => Arc::new(SimulatedSettlement::new(*success_rate)),
        SettlementConfig::Fixed { outcome } => Arc::new(FixedSettlement(*outcome)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementOutcome {
    Approved,
    Declined,
}

impl SettlementOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementOutcome::Approved => "approved",
            SettlementOutcome::Declined => "declined",
        }
    }
}

/// The gateway could not reach a decision at all (as opposed to declining).
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("settlement network unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SettlementGateway: Send + Sync {
    /// Decide whether a validated payment goes through.
    async fn settle(&self, payment: &PaymentInstruction) -> Result<SettlementOutcome, SettlementError>;
}

/// Approves each payment independently with probability `success_rate`.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedSettlement {
    success_rate: f64,
}

impl SimulatedSettlement {
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() { 0.0 } else { success_rate.clamp(0.0, 1.0) };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    fn draw(&self) -> SettlementOutcome {
        if rng().random_bool(self.success_rate) {
            SettlementOutcome::Approved
        } else {
            SettlementOutcome::Declined
        }
    }
}

#[async_trait]
impl SettlementGateway for SimulatedSettlement {
    async fn settle(&self, _payment: &PaymentInstruction) -> Result<SettlementOutcome, SettlementError> {
        Ok(self.draw())
    }
}

/// Always returns the same outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedSettlement(pub SettlementOutcome);

impl FixedSettlement {
    pub fn approve() -> Self {
        Self(SettlementOutcome::Approved)
    }

    pub fn decline() -> Self {
        Self(SettlementOutcome::Declined)
    }
}

#[async_trait]
impl SettlementGateway for FixedSettlement {
    async fn settle(&self, _payment: &PaymentInstruction) -> Result<SettlementOutcome, SettlementError> {
        Ok(self.0)
    }
}
