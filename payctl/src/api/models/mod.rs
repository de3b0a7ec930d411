//! API request and response data models.
//!
//! These structures define the public HTTP contract and are kept separate from
//! the database records in [`crate::db::models`].
//!
//! - [`auth`]: Signup/login payloads and their validation
//! - [`users`]: User profile, role and the token-derived [`users::CurrentUser`]
//! - [`transactions`]: Payment requests, ledger entries and currency codes
//! - [`responses`]: The success envelope and health body
//!
//! All models derive `utoipa::ToSchema` for the generated OpenAPI document.

pub mod auth;
pub mod responses;
pub mod transactions;
pub mod users;
