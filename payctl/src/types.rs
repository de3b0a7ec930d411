//! Common type definitions.
//!
//! Entity identifiers are the integer row ids SQLite generates; they are
//! wrapped in type aliases so signatures say which entity they refer to.
//!
//! - [`UserId`]: User account identifier
//! - [`TransactionId`]: Ledger entry identifier

pub type UserId = i64;
pub type TransactionId = i64;
