use async_trait::async_trait;

use crate::error::AdminError;
use crate::schema::{AppUser, IndexListing, IndexSpec};

/// Administrative operations against a database server.
///
/// Every call is a blocking round-trip; implementations hold the connection
/// and the currently selected database.
#[async_trait]
pub trait SchemaAdmin: Send {
    /// Switch to database `name`; later calls are scoped to it.
    async fn select_database(&mut self, name: &str) -> Result<(), AdminError>;

    /// Create an authenticable principal on the selected database.
    async fn create_user(&mut self, user: &AppUser) -> Result<(), AdminError>;

    /// Create a collection explicitly.
    async fn create_collection(&mut self, name: &str) -> Result<(), AdminError>;

    /// Create `index` on `collection`.
    async fn create_index(&mut self, collection: &str, index: &IndexSpec)
        -> Result<(), AdminError>;

    async fn user_exists(&mut self, username: &str) -> Result<bool, AdminError>;

    async fn list_collections(&mut self) -> Result<Vec<String>, AdminError>;

    /// Indexes on `collection`, excluding the implicit `_id` index. A missing
    /// collection yields an empty listing.
    async fn list_indexes(&mut self, collection: &str) -> Result<IndexListing, AdminError>;
}
