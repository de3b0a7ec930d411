//! HMAC-SHA256 signing for Standard Webhooks compliance.
//!
//! - Signature is computed over: `{msg_id}.{timestamp}.{payload}`
//! - The signature is base64-encoded HMAC-SHA256, prefixed `v1,`
//! - Headers: `webhook-id`, `webhook-timestamp`, `webhook-signature`
//!
//! See: <https://www.standardwebhooks.com/>

use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Prefix for webhook secrets
pub const SECRET_PREFIX: &str = "whsec_";

pub const HEADER_ID: &str = "webhook-id";
pub const HEADER_TIMESTAMP: &str = "webhook-timestamp";
pub const HEADER_SIGNATURE: &str = "webhook-signature";

/// Signs outgoing payloads with a decoded `whsec_` secret.
#[derive(Clone)]
pub struct WebhookSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for WebhookSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSigner").finish_non_exhaustive()
    }
}

impl WebhookSigner {
    /// Returns `None` if the secret lacks the `whsec_` prefix, is not valid
    /// base64, or decodes to nothing.
    pub fn from_secret(secret: &str) -> Option<Self> {
        let key = decode_secret(secret)?;
        if key.is_empty() {
            return None;
        }
        let mac = HmacSha256::new_from_slice(&key).ok()?;
        Some(Self { mac })
    }

    /// Signature header value (`v1,{base64}`) for one delivery.
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &str) -> String {
        format!("v1,{}", BASE64_STANDARD.encode(self.digest(msg_id, timestamp, payload)))
    }

    /// Check a `webhook-signature` header value. Multiple space-separated
    /// signatures are accepted, as during secret rotation.
    #[cfg(test)]
    pub(crate) fn verify(&self, msg_id: &str, timestamp: i64, payload: &str, signature_header: &str) -> bool {
        let expected = self.digest(msg_id, timestamp, payload);
        signature_header
            .split_whitespace()
            .filter_map(|sig| sig.strip_prefix("v1,"))
            .filter_map(|encoded| BASE64_STANDARD.decode(encoded).ok())
            .any(|candidate| constant_time_eq(&candidate, &expected))
    }

    fn digest(&self, msg_id: &str, timestamp: i64, payload: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(format!("{msg_id}.{timestamp}.{payload}").as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Extract the raw secret bytes from a `whsec_` prefixed secret.
pub fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    let encoded = secret.strip_prefix(SECRET_PREFIX)?;
    BASE64_STANDARD.decode(encoded).ok()
}

/// Constant-time byte comparison.
#[cfg(test)]
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
