/// Remote document store seam
///
/// Every user's data is a single document keyed by their `UserId`. The store
/// only has to support three calls, which is all the repository needs:
///
/// - **get**: fetch the whole document, or `None` when the user has none yet
/// - **create_if_absent**: write a document only if nothing is stored
/// - **update**: overwrite the named top-level fields, leaving the rest alone
///
/// # Implementations
///
/// - **Memory**: in-process map with failure injection, for tests and the
///   bundled document server
/// - **Http**: client for the `questboard-api` document server
///
/// # Example
///
/// ```no_run
/// use questboard_shared::models::{UserDocument, UserId};
/// use questboard_shared::store::{DocumentStore, MemoryDocumentStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryDocumentStore::new();
/// let user = UserId::new("user-1").unwrap();
///
/// store.create_if_absent(&user, UserDocument::seed()).await?;
/// store.update(&user, UserDocument::with_points(650)).await?;
///
/// let document = store.get(&user).await?.unwrap();
/// assert_eq!(document.points, Some(650));
/// # Ok(())
/// # }
/// ```

pub mod config;
pub mod http;
pub mod memory;
pub mod timeout;

use crate::models::{UserDocument, UserId};
use async_trait::async_trait;
use std::time::Duration;

pub use config::StoreConfig;
pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;
pub use timeout::StoreTimeout;

/// Document store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document exists for the user
    #[error("No document stored for user {0}")]
    NotFound(UserId),

    /// The call did not finish within the configured timeout
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// The store refused or could not serve the call
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Network or protocol failure talking to the store
    #[error("Transport error: {0}")]
    Transport(String),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Per-user document storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store name, used in logs and health output
    fn name(&self) -> &str;

    /// Fetches the user's full document
    async fn get(&self, user: &UserId) -> StoreResult<Option<UserDocument>>;

    /// Writes `document` only when none exists yet
    ///
    /// Returns `true` when the document was created, `false` when one was
    /// already present (which is left untouched).
    async fn create_if_absent(&self, user: &UserId, document: UserDocument) -> StoreResult<bool>;

    /// Replaces the top-level fields present in `patch`
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when the user has no document.
    async fn update(&self, user: &UserId, patch: UserDocument) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let user = UserId::new("u-1").unwrap();
        assert_eq!(
            StoreError::NotFound(user).to_string(),
            "No document stored for user u-1"
        );
        assert_eq!(
            StoreError::Timeout(Duration::from_millis(250)).to_string(),
            "Store call timed out after 250ms"
        );
        assert_eq!(
            StoreError::Unavailable("offline".to_string()).to_string(),
            "Store unavailable: offline"
        );
    }
}
