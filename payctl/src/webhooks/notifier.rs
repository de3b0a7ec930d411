//! Outbound delivery of payment events.
//!
//! One POST per event, bounded by the configured timeout. There is no retry
//! and no record of failed deliveries: a failure is logged, counted and
//! returned to the caller, which for payments means it is dropped.

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::webhooks::events::WebhookEvent;
use crate::webhooks::signing::{HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP, WebhookSigner};

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook request timed out")]
    Timeout,

    #[error("webhook endpoint responded with HTTP {status}")]
    Rejected { status: u16 },

    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to serialize webhook event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("webhook.signing_secret must be a whsec_-prefixed base64 string")]
    InvalidSecret,

    #[error("failed to build webhook HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Outcome of a delivery attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// No endpoint configured
    Skipped,
    Delivered { status: u16 },
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    endpoint: Option<Url>,
    source: String,
    http_client: reqwest::Client,
    signer: Option<WebhookSigner>,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self, WebhookError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(WebhookError::Client)?;

        let signer = match config.signing_secret.as_deref() {
            Some(secret) => Some(WebhookSigner::from_secret(secret).ok_or(WebhookError::InvalidSecret)?),
            None => None,
        };

        Ok(Self {
            endpoint: config.url.clone(),
            source: config.source.clone(),
            http_client,
            signer,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// The `source` stamped on every event.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Deliver one event and wait for the endpoint's answer.
    pub async fn notify(&self, event: &WebhookEvent) -> Result<Delivery, WebhookError> {
        let Some(endpoint) = &self.endpoint else {
            debug!("No webhook URL configured, skipping");
            return Ok(Delivery::Skipped);
        };

        let payload = serde_json::to_string(event)?;
        let msg_id = format!("msg_{}", Uuid::new_v4().simple());

        let mut request = self
            .http_client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(HEADER_ID, &msg_id);

        if let Some(signer) = &self.signer {
            let timestamp = Utc::now().timestamp();
            request = request
                .header(HEADER_TIMESTAMP, timestamp.to_string())
                .header(HEADER_SIGNATURE, signer.sign(&msg_id, timestamp, &payload));
        }

        let response = request.body(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                WebhookError::Timeout
            } else {
                WebhookError::Transport(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(Delivery::Delivered { status: status.as_u16() })
        } else {
            Err(WebhookError::Rejected { status: status.as_u16() })
        }
    }

    /// Deliver in the background. The outcome is logged and counted but never
    /// reported back; returns `None` when no endpoint is configured.
    pub fn dispatch(&self, event: WebhookEvent) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            debug!("No webhook URL configured, skipping");
            return None;
        }

        let notifier = self.clone();
        Some(tokio::spawn(async move {
            let transaction_id = event.data.transaction_id;
            match notifier.notify(&event).await {
                Ok(Delivery::Delivered { status }) => {
                    metrics::counter!("payctl_webhook_deliveries_total", "result" => "delivered").increment(1);
                    info!(transaction_id, status, event = %event.event, "Webhook delivered successfully");
                }
                Ok(Delivery::Skipped) => {}
                Err(e) => {
                    metrics::counter!("payctl_webhook_deliveries_total", "result" => "failed").increment(1);
                    warn!(transaction_id, error = %e, "Webhook delivery failed, payment already recorded");
                }
            }
        }))
    }
}
