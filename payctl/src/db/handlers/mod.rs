//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed SQLite connection (a pooled connection or
//! an open transaction) and exposes typed queries returning models from
//! [`crate::db::models`].
//!
//! - [`Users`]: Credential store (accounts and password hashes)
//! - [`Transactions`]: Append-only payment ledger
//!
//! ```ignore
//! use payctl::db::handlers::{Repository, Users};
//!
//! let mut conn = pool.acquire().await?;
//! let mut users = Users::new(&mut conn);
//! if let Some(user) = users.find_by_email("psp@example.com").await? {
//!     println!("found user {}", user.id);
//! }
//! ```

pub mod repository;
pub mod transactions;
pub mod users;

pub use repository::Repository;
pub use transactions::Transactions;
pub use users::Users;
