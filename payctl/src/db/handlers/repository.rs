//! Base repository trait for database operations.

use crate::db::errors::Result;

/// Contains the Repository trait.
///
/// A repository is the data access layer for one SQLite table. Rows are only
/// ever inserted and read: users are immutable after signup and ledger entries
/// are append-only, so the trait has no update or delete.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;
}
