//! Authentication.
//!
//! - [`password`]: Argon2id hashing, run on the blocking pool
//! - [`session`]: Stateless signed session tokens
//! - [`middleware`]: Bearer-token gate for protected routes
//! - [`current_user`]: Extractor for the authenticated user in handlers
//!
//! ```ignore
//! async fn protected_handler(user: CurrentUser) -> Result<String> {
//!     Ok(format!("Hello, {}!", user.email))
//! }
//! ```

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod session;
