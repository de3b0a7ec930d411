//! HTTP request handlers.
//!
//! - [`auth`]: Signup and login
//! - [`payments`]: Sending a payment
//! - [`transactions`]: The caller's payment history
//! - [`health`]: Liveness
//!
//! Handlers take JSON bodies as `Result<Json<T>, JsonRejection>` so malformed
//! input surfaces as a validation error in the standard envelope rather than
//! axum's plain-text rejection.

pub mod auth;
pub mod health;
pub mod payments;
pub mod transactions;
