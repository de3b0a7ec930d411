//! Outbound webhook notifications for completed payments.
//!
//! - [`events`]: The `payment.completed` payload
//! - [`signing`]: Optional HMAC-SHA256 signatures in the Standard Webhooks format
//! - [`notifier`]: Fire-and-forget HTTP delivery with a hard timeout

pub mod events;
pub mod notifier;
pub mod signing;

pub use events::{WebhookEvent, WebhookEventType};
pub use notifier::{Delivery, WebhookError, WebhookNotifier};
