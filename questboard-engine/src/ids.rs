/// Identifier generation
///
/// Task and shop item ids are millisecond timestamps, which keeps them
/// roughly ordered by creation time. Two adds within the same millisecond
/// (or a clock that steps backwards) would collide, so the generator never
/// hands out a value at or below the last one it issued, and skips any id
/// already present in the list it is adding to.
///
/// Storage items are purchase instances: the same shop item can be bought
/// many times, so their `unique_id` combines the shop item id with a random
/// UUID.

use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

/// Source of numeric entity ids
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id not contained in `taken`
    ///
    /// The result is strictly greater than every id this generator issued
    /// before.
    pub fn next_id<I>(&mut self, taken: I) -> i64
    where
        I: IntoIterator<Item = i64>,
    {
        let taken: HashSet<i64> = taken.into_iter().collect();
        let mut candidate = Utc::now().timestamp_millis().max(self.last + 1);
        while taken.contains(&candidate) {
            candidate += 1;
        }
        self.last = candidate;
        candidate
    }
}

/// Builds a storage item id for a purchase of `shop_item_id`
pub fn storage_unique_id(shop_item_id: i64) -> String {
    format!("{}-{}", shop_item_id, Uuid::new_v4())
}
