/// Category model
///
/// Categories group tasks into columns. The id is a slug derived from the
/// display name and is what tasks reference.

use serde::{Deserialize, Serialize};

/// Category every task falls back to
pub const DEFAULT_CATEGORY_ID: &str = "general";

/// A task category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Slug, e.g. `deep-work`
    pub id: String,

    /// Display name, e.g. `Deep Work`
    pub name: String,
}

impl Category {
    /// Creates a category from a display name, deriving the id
    pub fn from_name(name: &str) -> Self {
        Category {
            id: Self::slug(name),
            name: name.trim().to_string(),
        }
    }

    /// Derives a category id: trimmed, lowercased, whitespace runs become `-`
    pub fn slug(name: &str) -> String {
        name.split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    /// True when this category collides with `name` by id or display name
    pub fn collides_with(&self, name: &str) -> bool {
        let normalized = name.trim().to_lowercase();
        self.name.trim().to_lowercase() == normalized || self.id.to_lowercase() == Self::slug(name)
    }

    /// Seed categories for a new user
    pub fn defaults() -> Vec<Category> {
        vec![
            Category {
                id: "general".to_string(),
                name: "General".to_string(),
            },
            Category {
                id: "work".to_string(),
                name: "Work".to_string(),
            },
            Category {
                id: "personal".to_string(),
                name: "Personal".to_string(),
            },
        ]
    }
}
