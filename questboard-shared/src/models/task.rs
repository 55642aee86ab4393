/// Task model
///
/// Tasks are user-defined chores that pay out points when completed. They
/// live inside the user's document as the `tasks` array.
///
/// # Wire format
///
/// ```json
/// {
///   "id": 1729339200000,
///   "name": "Exercise",
///   "points": 50,
///   "category": "general",
///   "useType": "Unlimited",
///   "frequency": null,
///   "completed": false,
///   "createdAt": "2024-10-19T12:00:00Z"
/// }
/// ```
///
/// Documents written by older clients may omit `category`, `useType`,
/// `completed` or `createdAt`; those fall back to the same defaults the
/// writer applies.

use super::category::DEFAULT_CATEGORY_ID;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Whether a task is meant to be done a bounded number of times
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UseType {
    /// Task is done on a schedule or a fixed number of times
    Limited,

    /// Task can be repeated freely
    #[default]
    Unlimited,
}

impl fmt::Display for UseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UseType::Limited => write!(f, "Limited"),
            UseType::Unlimited => write!(f, "Unlimited"),
        }
    }
}

/// Repetition schedule of a limited task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "Daily"),
            Frequency::Weekly => write!(f, "Weekly"),
            Frequency::Monthly => write!(f, "Monthly"),
        }
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY_ID.to_string()
}

/// A task owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique id within the user's task list
    pub id: i64,

    /// Display name, unique case-insensitively at creation time
    #[validate(length(min = 1))]
    pub name: String,

    /// Points paid out on completion, at most `MAX_POINTS`
    #[validate(range(min = 0, max = 1_000_000_000))]
    pub points: i64,

    /// Id of the category the task is filed under
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    pub use_type: UseType,

    /// `None` means "no fixed frequency"
    #[serde(default)]
    pub frequency: Option<Frequency>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a new, not yet completed task from a draft
    pub fn from_draft(id: i64, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Task {
            id,
            name: draft.name,
            points: draft.points,
            category: draft
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(default_category),
            use_type: draft.use_type.unwrap_or_default(),
            frequency: draft.frequency,
            completed: false,
            created_at,
        }
    }

    /// Case-insensitive name comparison used for duplicate detection
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[validate(length(min = 1))]
    pub name: String,

    /// Must be strictly positive for new tasks
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub points: i64,

    /// Defaults to `general`
    #[serde(default)]
    pub category: Option<String>,

    /// Defaults to `Unlimited`
    #[serde(default)]
    pub use_type: Option<UseType>,

    #[serde(default)]
    pub frequency: Option<Frequency>,
}

impl TaskDraft {
    /// Creates a draft with the required fields
    pub fn new(name: impl Into<String>, points: i64) -> Self {
        TaskDraft {
            name: name.into(),
            points,
            ..Default::default()
        }
    }

    /// Files the task under the given category id
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Makes the task limited with an optional schedule
    pub fn limited(mut self, frequency: Option<Frequency>) -> Self {
        self.use_type = Some(UseType::Limited);
        self.frequency = frequency;
        self
    }
}

/// Partial edit of an existing task
///
/// `None` leaves a field unchanged. `frequency: Some(None)` clears the
/// schedule. Completion is not part of a patch; it only changes through
/// `toggle_task_completion`, which settles the points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub name: Option<String>,
    pub points: Option<i64>,
    pub category: Option<String>,
    pub use_type: Option<UseType>,
    pub frequency: Option<Option<Frequency>>,
}

impl TaskPatch {
    /// Returns a copy of `task` with the patch applied
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut updated = task.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(points) = self.points {
            updated.points = points;
        }
        if let Some(category) = &self.category {
            updated.category = category.clone();
        }
        if let Some(use_type) = self.use_type {
            updated.use_type = use_type;
        }
        if let Some(frequency) = self.frequency {
            updated.frequency = frequency;
        }
        updated
    }
}
