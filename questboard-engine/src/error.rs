/// Reconciler error types
///
/// Validation failures (`InvalidInput`, `DuplicateName`, `NotFound`,
/// `CategoryInUse`, `InsufficientPoints`) are raised before any local
/// change, so they never leave the snapshot half-modified. `Persistence` is
/// raised after the optimistic change was applied; what happened to the local
/// snapshot then depends on the operation's failure policy.

use questboard_shared::store::StoreError;
use std::fmt;
use validator::ValidationErrors;

/// Kind of entity an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Task,
    Category,
    ShopItem,
    StorageItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => write!(f, "task"),
            EntityKind::Category => write!(f, "category"),
            EntityKind::ShopItem => write!(f, "shop item"),
            EntityKind::StorageItem => write!(f, "storage item"),
        }
    }
}

/// Errors returned by reconciler operations
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// No user is signed in, or the loaded state belongs to someone else
    #[error("No authenticated session")]
    NotAuthenticated,

    /// Input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An entity with the same (case-insensitive) name exists
    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    /// The referenced entity does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// The category still has tasks filed under it
    #[error("Category '{id}' still has {tasks} task(s)")]
    CategoryInUse { id: String, tasks: usize },

    /// The balance does not cover the price
    #[error("Insufficient points: need {needed}, have {available}")]
    InsufficientPoints { needed: i64, available: i64 },

    /// The remote write (or read) failed or timed out
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

/// Reconciler result type alias
pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    pub(crate) fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        ReconcileError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: EntityKind, name: &str) -> Self {
        ReconcileError::DuplicateName {
            kind,
            name: name.trim().to_string(),
        }
    }

    /// True for errors raised before any local change was made
    pub fn is_rejection(&self) -> bool {
        !matches!(self, ReconcileError::Persistence(_))
    }

    /// Short message suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            ReconcileError::NotAuthenticated => "You must be logged in to do that".to_string(),
            ReconcileError::InvalidInput(msg) => format!("Please check your input: {}", msg),
            ReconcileError::DuplicateName { kind, .. } => {
                format!("A {} with this name already exists", kind)
            }
            ReconcileError::NotFound { kind, .. } => {
                let kind = kind.to_string();
                let mut chars = kind.chars();
                match chars.next() {
                    Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
                    None => "Not found".to_string(),
                }
            }
            ReconcileError::CategoryInUse { .. } => {
                "Cannot delete category with existing tasks".to_string()
            }
            ReconcileError::InsufficientPoints { .. } => "Not enough points".to_string(),
            ReconcileError::Persistence(_) => "Failed to save changes. Please try again.".to_string(),
        }
    }
}

impl From<ValidationErrors> for ReconcileError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        ReconcileError::InvalidInput(format!("invalid value for {}", fields.join(", ")))
    }
}
