/// Data models for Questboard
///
/// Everything a user owns lives in a single remote document. These types
/// describe that document and its parts.
///
/// # Models
///
/// - `user`: Opaque user identity
/// - `task`: Point-earning tasks, drafts and patches
/// - `category`: Task categories and slug derivation
/// - `shop_item`: Shop rewards and purchased storage instances
/// - `state`: The user document and the in-memory snapshot built from it
///
/// # Example
///
/// ```
/// use questboard_shared::models::{Task, TaskDraft, UserState};
///
/// let mut state = UserState::default();
/// let task = Task::from_draft(1, TaskDraft::new("Exercise", 50), chrono::Utc::now());
/// state.tasks.push(task);
///
/// assert_eq!(state.tasks_in_category("general"), 1);
/// ```

pub mod category;
pub mod shop_item;
pub mod state;
pub mod task;
pub mod user;

pub use category::{Category, DEFAULT_CATEGORY_ID};
pub use shop_item::{ShopItem, ShopItemDraft, ShopItemPatch, StorageItem};
pub use state::{StateField, UserDocument, UserState, DEFAULT_POINTS, MAX_POINTS};
pub use task::{Frequency, Task, TaskDraft, TaskPatch, UseType};
pub use user::UserId;
