/// User document and in-memory user state
///
/// The remote store keeps one document per user:
///
/// ```json
/// {
///   "points": 500,
///   "tasks": [],
///   "categories": [{"id": "general", "name": "General"}],
///   "shopItems": [],
///   "storageItems": [],
///   "settings": {"theme": "light"}
/// }
/// ```
///
/// `UserDocument` mirrors that document with every known field optional, so
/// the same type serves as a full document and as a partial update. Fields
/// this crate does not know about (`settings`, `createdAt`, ...) ride along
/// in `extra` and are never rewritten by partial updates.
///
/// `UserState` is the fully populated snapshot the reconciler works on.

use super::category::Category;
use super::shop_item::{ShopItem, StorageItem};
use super::task::Task;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Starting balance for a new user, and the value used when `points` is missing
pub const DEFAULT_POINTS: i64 = 500;

/// Upper bound for a task's reward and a shop item's price
pub const MAX_POINTS: i64 = 1_000_000_000;

/// Top-level fields of a user document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StateField {
    Points,
    Tasks,
    Categories,
    ShopItems,
    StorageItems,
}

impl StateField {
    /// Every known field, in document order
    pub const ALL: [StateField; 5] = [
        StateField::Points,
        StateField::Tasks,
        StateField::Categories,
        StateField::ShopItems,
        StateField::StorageItems,
    ];

    /// Field name as stored in the document
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::Points => "points",
            StateField::Tasks => "tasks",
            StateField::Categories => "categories",
            StateField::ShopItems => "shopItems",
            StateField::StorageItems => "storageItems",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user document, or a partial update of one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_items: Option<Vec<ShopItem>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_items: Option<Vec<StorageItem>>,

    /// Unknown top-level fields, preserved untouched
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UserDocument {
    /// The document written for a user on first login
    pub fn seed() -> Self {
        UserState::default().to_document()
    }

    /// Partial update carrying only `points`
    pub fn with_points(points: i64) -> Self {
        UserDocument {
            points: Some(points),
            ..Default::default()
        }
    }

    /// Partial update carrying only `tasks`
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        UserDocument {
            tasks: Some(tasks),
            ..Default::default()
        }
    }

    /// Partial update carrying only `categories`
    pub fn with_categories(categories: Vec<Category>) -> Self {
        UserDocument {
            categories: Some(categories),
            ..Default::default()
        }
    }

    /// Partial update carrying only `shopItems`
    pub fn with_shop_items(shop_items: Vec<ShopItem>) -> Self {
        UserDocument {
            shop_items: Some(shop_items),
            ..Default::default()
        }
    }

    /// Partial update carrying only `storageItems`
    pub fn with_storage_items(storage_items: Vec<StorageItem>) -> Self {
        UserDocument {
            storage_items: Some(storage_items),
            ..Default::default()
        }
    }

    /// Overwrites exactly the fields present in `patch`
    pub fn merge(&mut self, patch: UserDocument) {
        if patch.points.is_some() {
            self.points = patch.points;
        }
        if patch.tasks.is_some() {
            self.tasks = patch.tasks;
        }
        if patch.categories.is_some() {
            self.categories = patch.categories;
        }
        if patch.shop_items.is_some() {
            self.shop_items = patch.shop_items;
        }
        if patch.storage_items.is_some() {
            self.storage_items = patch.storage_items;
        }
        self.extra.extend(patch.extra);
    }

    /// Known fields this document carries
    pub fn present_fields(&self) -> Vec<StateField> {
        StateField::ALL
            .into_iter()
            .filter(|field| self.has_field(*field))
            .collect()
    }

    /// Known fields this document lacks
    pub fn missing_fields(&self) -> Vec<StateField> {
        StateField::ALL
            .into_iter()
            .filter(|field| !self.has_field(*field))
            .collect()
    }

    /// True when the document carries `field`
    pub fn has_field(&self, field: StateField) -> bool {
        match field {
            StateField::Points => self.points.is_some(),
            StateField::Tasks => self.tasks.is_some(),
            StateField::Categories => self.categories.is_some(),
            StateField::ShopItems => self.shop_items.is_some(),
            StateField::StorageItems => self.storage_items.is_some(),
        }
    }

    /// Copy of this document restricted to `fields` (extra fields dropped)
    pub fn project(&self, fields: &[StateField]) -> UserDocument {
        let mut projected = UserDocument::default();
        for field in fields {
            match field {
                StateField::Points => projected.points = self.points,
                StateField::Tasks => projected.tasks = self.tasks.clone(),
                StateField::Categories => projected.categories = self.categories.clone(),
                StateField::ShopItems => projected.shop_items = self.shop_items.clone(),
                StateField::StorageItems => projected.storage_items = self.storage_items.clone(),
            }
        }
        projected
    }
}

/// Fully populated snapshot of one user's data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub points: i64,
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
    pub shop_items: Vec<ShopItem>,
    pub storage_items: Vec<StorageItem>,
}

impl Default for UserState {
    fn default() -> Self {
        UserState {
            points: DEFAULT_POINTS,
            tasks: Vec::new(),
            categories: Category::defaults(),
            shop_items: ShopItem::defaults(),
            storage_items: Vec::new(),
        }
    }
}

impl UserState {
    /// Builds a snapshot, filling fields the document lacks with seed values
    pub fn from_document(document: UserDocument) -> Self {
        let seed = UserState::default();
        UserState {
            points: document.points.unwrap_or(seed.points),
            tasks: document.tasks.unwrap_or(seed.tasks),
            categories: document.categories.unwrap_or(seed.categories),
            shop_items: document.shop_items.unwrap_or(seed.shop_items),
            storage_items: document.storage_items.unwrap_or(seed.storage_items),
        }
    }

    /// Full document for this snapshot
    pub fn to_document(&self) -> UserDocument {
        UserDocument {
            points: Some(self.points),
            tasks: Some(self.tasks.clone()),
            categories: Some(self.categories.clone()),
            shop_items: Some(self.shop_items.clone()),
            storage_items: Some(self.storage_items.clone()),
            extra: Map::new(),
        }
    }

    /// Overwrites the fields present in `document`, leaving the rest alone
    pub fn apply_document(&mut self, document: UserDocument) {
        if let Some(points) = document.points {
            self.points = points;
        }
        if let Some(tasks) = document.tasks {
            self.tasks = tasks;
        }
        if let Some(categories) = document.categories {
            self.categories = categories;
        }
        if let Some(shop_items) = document.shop_items {
            self.shop_items = shop_items;
        }
        if let Some(storage_items) = document.storage_items {
            self.storage_items = storage_items;
        }
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn shop_item(&self, id: i64) -> Option<&ShopItem> {
        self.shop_items.iter().find(|i| i.id == id)
    }

    pub fn storage_item(&self, unique_id: &str) -> Option<&StorageItem> {
        self.storage_items.iter().find(|i| i.unique_id == unique_id)
    }

    /// Number of tasks filed under `category_id`
    pub fn tasks_in_category(&self, category_id: &str) -> usize {
        self.tasks.iter().filter(|t| t.category == category_id).count()
    }
}
