/// State reconciler
///
/// The reconciler owns the in-memory `UserState` of the signed-in user and
/// mediates every change to it. Mutations are optimistic: the local snapshot
/// changes first and is published to subscribers immediately, then the
/// affected fields are written to the document store. When the write fails,
/// the operation's `FailurePolicy` decides what the snapshot looks like
/// afterwards (see `commit`).
///
/// # Lifecycle
///
/// ```text
/// new(repo, auth, config)
///   └─> start() / sync_with_auth()
///         ├─> user signed in, not loaded  → load (create/back-fill document)
///         ├─> same user already loaded    → nothing
///         └─> nobody signed in            → tear down (seed snapshot, no user)
/// ```
///
/// Operations take `&mut self`, so one mutation is in flight at a time.
///
/// # Example
///
/// ```no_run
/// use questboard_engine::{AuthSession, Reconciler, ReconcilerConfig};
/// use questboard_shared::models::{TaskDraft, UserId};
/// use questboard_shared::repository::Repository;
/// use questboard_shared::store::{MemoryDocumentStore, StoreTimeout};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Repository::new(Arc::new(MemoryDocumentStore::new()), StoreTimeout::default());
/// let auth = Arc::new(AuthSession::signed_in(UserId::new("user-1").unwrap()));
///
/// let mut reconciler = Reconciler::new(repo, auth, ReconcilerConfig::default());
/// reconciler.start().await?;
///
/// let task = reconciler.add_task(TaskDraft::new("Exercise", 50)).await?;
/// reconciler.toggle_task_completion(task.id).await?;
/// assert_eq!(reconciler.state().points, 550);
/// # Ok(())
/// # }
/// ```

mod categories;
mod commit;
mod shop;
mod storage;
mod tasks;

pub use commit::FailurePolicy;
pub use storage::ItemUse;

use crate::config::ReconcilerConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::events::{EventSink, NoticeLevel, ReconcilerEvent};
use crate::ids::IdGenerator;
use crate::session::AuthProvider;
use questboard_shared::models::{UserId, UserState};
use questboard_shared::repository::Repository;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Owner of the signed-in user's state
pub struct Reconciler {
    repo: Repository,
    auth: Arc<dyn AuthProvider>,
    config: ReconcilerConfig,
    ids: IdGenerator,

    /// User whose state is loaded, if any
    user: Option<UserId>,
    state: UserState,

    snapshot: watch::Sender<UserState>,
    events: EventSink,
    events_rx: Option<mpsc::UnboundedReceiver<ReconcilerEvent>>,
}

impl Reconciler {
    /// Creates a reconciler with nothing loaded
    pub fn new(repo: Repository, auth: Arc<dyn AuthProvider>, config: ReconcilerConfig) -> Self {
        let (snapshot, _) = watch::channel(UserState::default());
        let (events, events_rx) = EventSink::channel(config.notice_ttl);

        Reconciler {
            repo,
            auth,
            config,
            ids: IdGenerator::new(),
            user: None,
            state: UserState::default(),
            snapshot,
            events,
            events_rx: Some(events_rx),
        }
    }

    /// Loads state for whoever is signed in
    pub async fn start(&mut self) -> ReconcileResult<Option<UserId>> {
        tracing::info!(store = self.repo.store_name(), "Starting reconciler");
        self.sync_with_auth().await
    }

    /// Brings the loaded state in line with the auth provider
    ///
    /// Call this whenever the auth provider signals a change. Returns the user
    /// whose state is now loaded.
    pub async fn sync_with_auth(&mut self) -> ReconcileResult<Option<UserId>> {
        match self.auth.current_user() {
            Some(user) if self.user.as_ref() == Some(&user) => Ok(Some(user)),
            Some(user) => {
                self.teardown();
                self.load(user.clone()).await?;
                Ok(Some(user))
            }
            None => {
                self.teardown();
                Ok(None)
            }
        }
    }

    /// Re-reads the whole document for the current user
    pub async fn reload(&mut self) -> ReconcileResult<()> {
        let user = self.require_user()?;
        self.load(user).await
    }

    /// Receiver for auth changes, for driving `sync_with_auth`
    pub fn auth_changes(&self) -> watch::Receiver<Option<UserId>> {
        self.auth.subscribe()
    }

    /// Receiver that sees every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<UserState> {
        self.snapshot.subscribe()
    }

    /// Takes the event receiver; returns `None` after the first call
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ReconcilerEvent>> {
        self.events_rx.take()
    }

    /// Current local snapshot
    pub fn state(&self) -> &UserState {
        &self.state
    }

    /// User whose state is loaded
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// True when a user is signed in and their state is loaded
    pub fn is_active(&self) -> bool {
        self.require_user().is_ok()
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    async fn load(&mut self, user: UserId) -> ReconcileResult<()> {
        match self.repo.load_state(&user).await {
            Ok(state) => {
                tracing::info!(
                    user_id = %user,
                    tasks = state.tasks.len(),
                    points = state.points,
                    "Loaded user state"
                );
                self.state = state;
                self.user = Some(user);
                self.publish();
                Ok(())
            }
            Err(e) => {
                tracing::error!(user_id = %user, error = %e, "Failed to load user state");
                self.events
                    .notify(NoticeLevel::Error, "Failed to load your data. Please try again.");
                Err(ReconcileError::Persistence(e))
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!(user_id = %user, "Tearing down user state");
            self.state = UserState::default();
            self.publish();
        }
    }

    /// The signed-in user, provided their state is the one loaded
    fn require_user(&self) -> ReconcileResult<UserId> {
        match (self.auth.current_user(), self.user.as_ref()) {
            (Some(current), Some(loaded)) if &current == loaded => Ok(current),
            _ => Err(ReconcileError::NotAuthenticated),
        }
    }

    /// Balance after adding `amount`, rejected when it would overflow
    fn credited(&self, amount: i64) -> ReconcileResult<i64> {
        self.state.points.checked_add(amount).ok_or_else(|| {
            ReconcileError::InvalidInput(format!(
                "adding {} points would overflow the balance of {}",
                amount, self.state.points
            ))
        })
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.state.clone());
    }

    /// Logs the outcome of an operation and notifies the user
    fn report<T>(
        &self,
        action: &'static str,
        result: ReconcileResult<T>,
        success: impl FnOnce(&T) -> Option<String>,
    ) -> ReconcileResult<T> {
        match &result {
            Ok(value) => {
                if let Some(message) = success(value) {
                    self.events.notify(NoticeLevel::Success, message);
                }
            }
            Err(e) if e.is_rejection() => {
                tracing::debug!(action, error = %e, "Operation rejected");
                self.events.notify(NoticeLevel::Error, e.user_message());
            }
            Err(e) => {
                tracing::warn!(action, error = %e, "Operation failed");
                self.events.notify(NoticeLevel::Error, e.user_message());
            }
        }
        result
    }
}
