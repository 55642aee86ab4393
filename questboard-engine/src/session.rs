/// Auth provider seam
///
/// Sign-up, sign-in and credential handling belong to an external auth
/// service. The engine only needs to know who is signed in right now and to
/// hear about changes, so it can load or tear down that user's state.
///
/// `AuthSession` is the in-process implementation: the embedding application
/// forwards its auth callbacks into `sign_in`/`sign_out`, and watchers are
/// notified synchronously through a `tokio::sync::watch` channel.
///
/// # Example
///
/// ```
/// use questboard_engine::session::{AuthProvider, AuthSession};
/// use questboard_shared::models::UserId;
///
/// let session = AuthSession::new();
/// let changes = session.subscribe();
///
/// session.sign_in(UserId::new("user-1").unwrap());
/// assert!(changes.has_changed().unwrap());
/// assert_eq!(session.current_user().unwrap().as_str(), "user-1");
///
/// session.sign_out();
/// assert!(session.current_user().is_none());
/// ```

use questboard_shared::models::UserId;
use tokio::sync::watch;

/// Source of the current user identity
pub trait AuthProvider: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<UserId>;

    /// Receiver notified whenever the signed-in user changes
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;
}

/// In-process auth state
#[derive(Debug)]
pub struct AuthSession {
    current: watch::Sender<Option<UserId>>,
}

impl AuthSession {
    /// Creates a signed-out session
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        AuthSession { current }
    }

    /// Creates a session already signed in as `user`
    pub fn signed_in(user: UserId) -> Self {
        let session = AuthSession::new();
        session.sign_in(user);
        session
    }

    /// Records a successful sign-in
    pub fn sign_in(&self, user: UserId) {
        tracing::info!(user_id = %user, "User signed in");
        self.current.send_replace(Some(user));
    }

    /// Records a sign-out
    pub fn sign_out(&self) {
        if let Some(user) = self.current.send_replace(None) {
            tracing::info!(user_id = %user, "User signed out");
        }
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthProvider for AuthSession {
    fn current_user(&self) -> Option<UserId> {
        self.current.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.current.subscribe()
    }
}
