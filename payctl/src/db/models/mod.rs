//! Database record models.
//!
//! Create requests carry what a repository needs to insert a row; responses
//! are what it hands back. Row structs that map columns one-to-one stay
//! private to their repository in [`crate::db::handlers`].

pub mod transactions;
pub mod users;
