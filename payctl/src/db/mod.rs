//! Database layer.
//!
//! SQLx over SQLite, organised as repositories over borrowed connections:
//!
//! ```text
//! handlers / payments
//!        │
//!        ↓
//! db::handlers   (repositories: queries, row mapping)
//!        │
//!        ↓
//! db::models     (create requests and responses)
//!        │
//!        ↓
//!     SQLite     (schema in ./migrations)
//! ```
//!
//! Every write is a single statement, so repositories work equally on a
//! pooled connection or inside a transaction. The only multi-statement write
//! is demo seeding, which runs in one transaction.

pub mod errors;
pub mod handlers;
pub mod models;
