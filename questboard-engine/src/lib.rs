//! # Questboard Engine
//!
//! Client-side state reconciliation for the Questboard task manager: the
//! signed-in user's tasks, categories, shop and storage are held in memory,
//! changed optimistically and written back to the document store.
//!
//! ## Modules
//!
//! - `reconciler`: The `Reconciler` and its task, category, shop and storage
//!   operations
//! - `drag`: Turns board drag-and-drop events into category moves
//! - `session`: The auth provider seam and its in-process implementation
//! - `events`: Point events and user notifications
//! - `ids`: Task, shop item and storage instance identifiers
//! - `config`: Reconciler configuration from the environment
//! - `error`: `ReconcileError`
//!
//! ## Example
//!
//! ```no_run
//! use questboard_engine::{AuthSession, Reconciler, ReconcilerConfig};
//! use questboard_shared::models::UserId;
//! use questboard_shared::repository::Repository;
//! use questboard_shared::store::StoreConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store_config = StoreConfig::from_env()?;
//! let repo = Repository::new(store_config.build_store()?, store_config.timeout());
//! let auth = Arc::new(AuthSession::signed_in(UserId::new("user-1").unwrap()));
//!
//! let mut reconciler = Reconciler::new(repo, auth, ReconcilerConfig::from_env()?);
//! reconciler.start().await?;
//! println!("{} points", reconciler.state().points);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod drag;
pub mod error;
pub mod events;
pub mod ids;
pub mod reconciler;
pub mod session;

pub use config::{CompletionPolicy, ReconcilerConfig};
pub use drag::{DragEvent, DragOutcome, DragReassignmentHandler, DropTarget, IgnoreReason};
pub use error::{EntityKind, ReconcileError, ReconcileResult};
pub use events::{EventSink, NoticeLevel, Notification, ReconcilerEvent};
pub use reconciler::{FailurePolicy, ItemUse, Reconciler};
pub use session::{AuthProvider, AuthSession};
