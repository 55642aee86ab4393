/// Typed access to a user's document
///
/// The repository is the only component that talks to the document store.
/// Each save replaces one top-level field (or a fixed pair of fields) in a
/// single store call, so from the caller's point of view a save either fully
/// lands or fully fails. Every call is bounded by the store timeout.
///
/// # Loading
///
/// ```text
/// load_state(user)
///   ├─> get document
///   ├─> none?    create seeded document (never overwrites) and re-read
///   ├─> fields missing?  back-fill them remotely with seed values
///   └─> build UserState (missing fields → seed values)
/// ```
///
/// # Example
///
/// ```no_run
/// use questboard_shared::models::UserId;
/// use questboard_shared::repository::Repository;
/// use questboard_shared::store::{MemoryDocumentStore, StoreTimeout};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Repository::new(Arc::new(MemoryDocumentStore::new()), StoreTimeout::default());
/// let user = UserId::new("user-1").unwrap();
///
/// let state = repo.load_state(&user).await?;
/// repo.update_points(&user, state.points + 50).await?;
/// # Ok(())
/// # }
/// ```

use crate::models::{
    Category, ShopItem, StateField, StorageItem, Task, UserDocument, UserId, UserState,
};
use crate::store::{DocumentStore, StoreResult, StoreTimeout};
use std::sync::Arc;

/// Repository over a `DocumentStore`
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
    timeout: StoreTimeout,
}

impl Repository {
    /// Creates a repository using `store`, bounding each call by `timeout`
    pub fn new(store: Arc<dyn DocumentStore>, timeout: StoreTimeout) -> Self {
        Repository { store, timeout }
    }

    /// Name of the underlying store
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn timeout(&self) -> StoreTimeout {
        self.timeout
    }

    /// Loads the user's state, creating or back-filling the document as needed
    pub async fn load_state(&self, user: &UserId) -> StoreResult<UserState> {
        let document = match self.fetch(user).await? {
            Some(document) => document,
            None => {
                let created = self
                    .timeout
                    .run(self.store.create_if_absent(user, UserDocument::seed()))
                    .await??;
                tracing::info!(user_id = %user, created, "Initialized user document");

                // Someone else may have created it first; their copy wins
                self.fetch(user).await?.unwrap_or_else(UserDocument::seed)
            }
        };

        let missing = document.missing_fields();
        if !missing.is_empty() {
            let backfill = UserDocument::seed().project(&missing);
            tracing::info!(
                user_id = %user,
                fields = ?missing,
                "Back-filling missing document fields"
            );
            self.write(user, backfill).await?;
        }

        Ok(UserState::from_document(document))
    }

    /// Reads the named fields, substituting seed values for missing ones
    ///
    /// Used to re-sync part of the local snapshot after a failed write.
    pub async fn load_fields(
        &self,
        user: &UserId,
        fields: &[StateField],
    ) -> StoreResult<UserDocument> {
        let document = self.fetch(user).await?.unwrap_or_default();
        let state = UserState::from_document(document);
        Ok(state.to_document().project(fields))
    }

    /// Replaces the task list
    pub async fn save_tasks(&self, user: &UserId, tasks: &[Task]) -> StoreResult<()> {
        self.write(user, UserDocument::with_tasks(tasks.to_vec())).await
    }

    /// Replaces the category list
    pub async fn save_categories(&self, user: &UserId, categories: &[Category]) -> StoreResult<()> {
        self.write(user, UserDocument::with_categories(categories.to_vec()))
            .await
    }

    /// Replaces the shop item list
    pub async fn save_shop_items(&self, user: &UserId, items: &[ShopItem]) -> StoreResult<()> {
        self.write(user, UserDocument::with_shop_items(items.to_vec()))
            .await
    }

    /// Replaces the storage item list
    pub async fn save_storage_items(
        &self,
        user: &UserId,
        items: &[StorageItem],
    ) -> StoreResult<()> {
        self.write(user, UserDocument::with_storage_items(items.to_vec()))
            .await
    }

    /// Sets the point balance
    pub async fn update_points(&self, user: &UserId, points: i64) -> StoreResult<()> {
        self.write(user, UserDocument::with_points(points)).await
    }

    /// Replaces tasks and points in one call
    pub async fn save_tasks_and_points(
        &self,
        user: &UserId,
        tasks: &[Task],
        points: i64,
    ) -> StoreResult<()> {
        let patch = UserDocument {
            tasks: Some(tasks.to_vec()),
            points: Some(points),
            ..Default::default()
        };
        self.write(user, patch).await
    }

    /// Replaces points and storage items in one call
    pub async fn save_points_and_storage(
        &self,
        user: &UserId,
        points: i64,
        storage_items: &[StorageItem],
    ) -> StoreResult<()> {
        let patch = UserDocument {
            points: Some(points),
            storage_items: Some(storage_items.to_vec()),
            ..Default::default()
        };
        self.write(user, patch).await
    }

    /// Writes an arbitrary partial document
    pub async fn write(&self, user: &UserId, patch: UserDocument) -> StoreResult<()> {
        let fields = patch.present_fields();
        match self.timeout.run(self.store.update(user, patch)).await? {
            Ok(()) => {
                tracing::debug!(user_id = %user, fields = ?fields, "Saved document fields");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %user, fields = ?fields, error = %e, "Failed to save document fields");
                Err(e)
            }
        }
    }

    async fn fetch(&self, user: &UserId) -> StoreResult<Option<UserDocument>> {
        self.timeout.run(self.store.get(user)).await?
    }
}
