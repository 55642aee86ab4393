/// Shop and storage models
///
/// A `ShopItem` is a reward the user can buy with points. Every purchase
/// creates an independent `StorageItem` carrying a copy of the shop item's
/// fields, so editing or deleting the shop item never touches what was
/// already bought.
///
/// # Wire format
///
/// ```json
/// {
///   "id": 1,
///   "name": "1 Hour YouTube",
///   "price": 100,
///   "description": "1 hour of YouTube time",
///   "category": "entertainment",
///   "uniqueId": "1-0b6c9a7e-5d1f-4f0e-9a39-2f1e3c1f0d55",
///   "dateAcquired": "2024-10-19",
///   "inUse": false
/// }
/// ```

use super::category::DEFAULT_CATEGORY_ID;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

fn default_category() -> String {
    DEFAULT_CATEGORY_ID.to_string()
}

/// A reward offered in the shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShopItem {
    pub id: i64,

    /// Display name, unique case-insensitively
    #[validate(length(min = 1))]
    pub name: String,

    /// Price in points, between 1 and `MAX_POINTS`
    #[validate(range(min = 1, max = 1_000_000_000))]
    pub price: i64,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_category")]
    pub category: String,
}

impl ShopItem {
    /// Builds a shop item from a draft
    pub fn from_draft(id: i64, draft: ShopItemDraft) -> Self {
        ShopItem {
            id,
            name: draft.name.trim().to_string(),
            price: draft.price,
            description: draft.description.unwrap_or_default(),
            category: draft
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(default_category),
        }
    }

    /// Case-insensitive name comparison used for duplicate detection
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Points refunded when a purchased instance is sold back (half, rounded down)
    pub fn sell_price(&self) -> i64 {
        self.price / 2
    }

    /// Seed shop items for a new user
    pub fn defaults() -> Vec<ShopItem> {
        vec![
            ShopItem {
                id: 1,
                name: "1 Hour YouTube".to_string(),
                price: 100,
                description: "1 hour of YouTube time".to_string(),
                category: "entertainment".to_string(),
            },
            ShopItem {
                id: 2,
                name: "2 Hour Movie".to_string(),
                price: 200,
                description: "2 hours of movie time".to_string(),
                category: "entertainment".to_string(),
            },
        ]
    }
}

/// Input for creating a shop item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShopItemDraft {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = 1, max = 1_000_000_000))]
    pub price: i64,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub category: Option<String>,
}

impl ShopItemDraft {
    /// Creates a draft with the required fields
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        ShopItemDraft {
            name: name.into(),
            price,
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial edit of a shop item; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItemPatch {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl ShopItemPatch {
    /// Returns a copy of `item` with the patch applied
    pub fn apply_to(&self, item: &ShopItem) -> ShopItem {
        let mut updated = item.clone();
        if let Some(name) = &self.name {
            updated.name = name.trim().to_string();
        }
        if let Some(price) = self.price {
            updated.price = price;
        }
        if let Some(description) = &self.description {
            updated.description = description.clone();
        }
        if let Some(category) = &self.category {
            updated.category = category.clone();
        }
        updated
    }
}

/// One purchased instance of a shop item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageItem {
    /// Snapshot of the shop item at purchase time (`id` refers back to it)
    #[serde(flatten)]
    pub item: ShopItem,

    /// Identifies this instance among all purchases ever made
    pub unique_id: String,

    #[serde(with = "acquired_date")]
    pub date_acquired: NaiveDate,

    pub in_use: bool,
}

impl StorageItem {
    /// Creates a fresh, unused instance of `item`
    pub fn purchase(item: &ShopItem, unique_id: String, date_acquired: NaiveDate) -> Self {
        StorageItem {
            item: item.clone(),
            unique_id,
            date_acquired,
            in_use: false,
        }
    }
}

/// `YYYY-MM-DD` on write; older clients stored locale dates like `10/19/2024`
mod acquired_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const ACCEPTED_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ACCEPTED_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw.trim(), format).ok())
            .ok_or_else(|| de::Error::custom(format!("unrecognized acquisition date: {}", raw)))
    }
}
