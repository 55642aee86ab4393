/// In-memory document store
///
/// Keeps documents in a map behind an async `RwLock`. Besides backing the
/// bundled document server, it can simulate an unreliable remote:
///
/// - `fail_next_updates(n)`: the next `n` updates fail with `Unavailable`
/// - `fail_next_gets(n)`: the next `n` reads fail with `Unavailable`
/// - `set_offline(true)`: every call fails until switched back
/// - `set_latency(d)`: every call sleeps `d` first (pairs with timeouts)
///
/// Call counters let tests assert whether a store call happened at all.
///
/// # Example
///
/// ```no_run
/// use questboard_shared::models::{UserDocument, UserId};
/// use questboard_shared::store::{DocumentStore, MemoryDocumentStore};
///
/// # async fn example() {
/// let store = MemoryDocumentStore::new();
/// let user = UserId::new("user-1").unwrap();
/// store.insert(&user, UserDocument::seed()).await;
///
/// store.fail_next_updates(1);
/// assert!(store.update(&user, UserDocument::with_points(1)).await.is_err());
/// assert!(store.update(&user, UserDocument::with_points(2)).await.is_ok());
/// assert_eq!(store.update_calls(), 2);
/// # }
/// ```

use super::{DocumentStore, StoreError, StoreResult};
use crate::models::{UserDocument, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;

/// In-memory `DocumentStore`
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<UserId, UserDocument>>,

    offline: AtomicBool,
    failing_updates: AtomicUsize,
    failing_gets: AtomicUsize,
    latency_ms: AtomicU64,

    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryDocumentStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` directly, bypassing failure injection and counters
    pub async fn insert(&self, user: &UserId, document: UserDocument) {
        self.documents.write().await.insert(user.clone(), document);
    }

    /// Reads a stored document directly, bypassing failure injection and counters
    pub async fn document(&self, user: &UserId) -> Option<UserDocument> {
        self.documents.read().await.get(user).cloned()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Makes the next `count` updates fail
    pub fn fail_next_updates(&self, count: usize) {
        self.failing_updates.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` reads fail
    pub fn fail_next_gets(&self, count: usize) {
        self.failing_gets.store(count, Ordering::SeqCst);
    }

    /// Fails every call while `offline` is set
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delays every call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Sleeps for the configured latency and checks the offline switch
    async fn simulate_remote(&self) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    /// Consumes one injected failure from `counter`, if any
    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, user: &UserId) -> StoreResult<Option<UserDocument>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_remote().await?;

        if Self::take_failure(&self.failing_gets) {
            tracing::debug!(user_id = %user, "Memory store simulating read failure");
            return Err(StoreError::Unavailable("simulated read failure".to_string()));
        }

        Ok(self.documents.read().await.get(user).cloned())
    }

    async fn create_if_absent(&self, user: &UserId, document: UserDocument) -> StoreResult<bool> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_remote().await?;

        let mut documents = self.documents.write().await;
        if documents.contains_key(user) {
            return Ok(false);
        }
        documents.insert(user.clone(), document);
        Ok(true)
    }

    async fn update(&self, user: &UserId, patch: UserDocument) -> StoreResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_remote().await?;

        if Self::take_failure(&self.failing_updates) {
            tracing::debug!(user_id = %user, "Memory store simulating update failure");
            return Err(StoreError::Unavailable("simulated update failure".to_string()));
        }

        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(user)
            .ok_or_else(|| StoreError::NotFound(user.clone()))?;
        document.merge(patch);
        Ok(())
    }
}
