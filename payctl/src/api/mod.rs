//! REST API: route handlers and their request/response models.
//!
//! | Method | Path            | Auth   |
//! |--------|-----------------|--------|
//! | POST   | `/auth/signup`  | none   |
//! | POST   | `/auth/login`   | none   |
//! | POST   | `/send`         | bearer |
//! | GET    | `/transactions` | bearer |
//! | GET    | `/health`       | none   |
//!
//! Every route is also reachable under `/api`. Unknown paths, and known paths
//! called with another method, get the 404 error envelope.

pub mod handlers;
pub mod models;
