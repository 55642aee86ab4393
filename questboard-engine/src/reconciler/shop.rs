/// Shop operations: managing items, buying and selling

use super::commit::{FailurePolicy, Persist};
use super::Reconciler;
use crate::error::{EntityKind, ReconcileError, ReconcileResult};
use crate::events::ReconcilerEvent;
use crate::ids::storage_unique_id;
use chrono::Local;
use questboard_shared::models::{ShopItem, ShopItemDraft, ShopItemPatch, StateField, StorageItem};
use validator::Validate;

const RELOAD_SHOP: &[StateField] = &[StateField::ShopItems];

impl Reconciler {
    /// Adds an item to the shop
    ///
    /// A failed write removes the item again.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the name is blank or the price is not positive
    /// - `DuplicateName` if an item with the same name (ignoring case) exists
    pub async fn add_shop_item(&mut self, draft: ShopItemDraft) -> ReconcileResult<ShopItem> {
        let result = self.try_add_shop_item(draft).await;
        self.report("add_shop_item", result, |_| {
            Some("Shop item added successfully!".to_string())
        })
    }

    async fn try_add_shop_item(&mut self, mut draft: ShopItemDraft) -> ReconcileResult<ShopItem> {
        let user = self.require_user()?;

        draft.name = draft.name.trim().to_string();
        draft.validate()?;
        if self.state.shop_items.iter().any(|i| i.has_name(&draft.name)) {
            return Err(ReconcileError::duplicate(EntityKind::ShopItem, &draft.name));
        }

        // Storage items keep the id of the item they were bought from
        let taken = self
            .state
            .shop_items
            .iter()
            .map(|i| i.id)
            .chain(self.state.storage_items.iter().map(|s| s.item.id));
        let id = self.ids.next_id(taken);
        let item = ShopItem::from_draft(id, draft);

        let added = item.clone();
        self.commit(
            &user,
            "add_shop_item",
            Persist::ShopItems,
            FailurePolicy::Rollback,
            move |s| s.shop_items.push(added),
        )
        .await?;

        tracing::info!(user_id = %user, item_id = item.id, name = %item.name, "Shop item added");
        Ok(item)
    }

    /// Applies `patch` to the shop item with `id`
    ///
    /// Items already bought keep the values they were bought with. A failed
    /// write reloads shop items from the store.
    pub async fn update_shop_item(
        &mut self,
        id: i64,
        patch: ShopItemPatch,
    ) -> ReconcileResult<ShopItem> {
        let result = self.try_update_shop_item(id, patch).await;
        self.report("update_shop_item", result, |_| {
            Some("Item updated successfully!".to_string())
        })
    }

    async fn try_update_shop_item(
        &mut self,
        id: i64,
        patch: ShopItemPatch,
    ) -> ReconcileResult<ShopItem> {
        let user = self.require_user()?;

        let current = self
            .state
            .shop_item(id)
            .ok_or_else(|| ReconcileError::not_found(EntityKind::ShopItem, id))?;
        let updated = patch.apply_to(current);
        updated.validate()?;
        let duplicate = self
            .state
            .shop_items
            .iter()
            .any(|i| i.id != id && i.has_name(&updated.name));
        if duplicate {
            return Err(ReconcileError::duplicate(EntityKind::ShopItem, &updated.name));
        }

        let replacement = updated.clone();
        self.commit(
            &user,
            "update_shop_item",
            Persist::ShopItems,
            FailurePolicy::Reload(RELOAD_SHOP),
            move |s| {
                if let Some(item) = s.shop_items.iter_mut().find(|i| i.id == id) {
                    *item = replacement;
                }
            },
        )
        .await?;

        Ok(updated)
    }

    /// Removes the shop item with `id`
    ///
    /// Returns `false` without touching the store when no such item exists.
    /// Purchased instances stay in storage. A failed write reloads shop items
    /// from the store.
    pub async fn delete_shop_item(&mut self, id: i64) -> ReconcileResult<bool> {
        let result = self.try_delete_shop_item(id).await;
        self.report("delete_shop_item", result, |deleted| {
            deleted.then(|| "Shop item deleted successfully!".to_string())
        })
    }

    async fn try_delete_shop_item(&mut self, id: i64) -> ReconcileResult<bool> {
        let user = self.require_user()?;

        if self.state.shop_item(id).is_none() {
            return Ok(false);
        }

        self.commit(
            &user,
            "delete_shop_item",
            Persist::ShopItems,
            FailurePolicy::Reload(RELOAD_SHOP),
            move |s| s.shop_items.retain(|i| i.id != id),
        )
        .await?;

        tracing::info!(user_id = %user, item_id = id, "Shop item deleted");
        Ok(true)
    }

    /// Buys one instance of the shop item with `item_id`
    ///
    /// Points and storage are written together; a failed write restores both.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no such shop item
    /// - `InsufficientPoints` if the balance is below the price
    pub async fn buy_item(&mut self, item_id: i64) -> ReconcileResult<StorageItem> {
        let result = self.try_buy_item(item_id).await;
        self.report("buy_item", result, |bought| {
            Some(format!("Purchased {}!", bought.item.name))
        })
    }

    async fn try_buy_item(&mut self, item_id: i64) -> ReconcileResult<StorageItem> {
        let user = self.require_user()?;

        let item = self
            .state
            .shop_item(item_id)
            .cloned()
            .ok_or_else(|| ReconcileError::not_found(EntityKind::ShopItem, item_id))?;
        if self.state.points < item.price {
            return Err(ReconcileError::InsufficientPoints {
                needed: item.price,
                available: self.state.points,
            });
        }

        let bought = StorageItem::purchase(
            &item,
            storage_unique_id(item.id),
            Local::now().date_naive(),
        );

        let price = item.price;
        let added = bought.clone();
        self.commit(
            &user,
            "buy_item",
            Persist::PointsAndStorage,
            FailurePolicy::Rollback,
            move |s| {
                s.points -= price;
                s.storage_items.push(added);
            },
        )
        .await?;

        let balance = self.state.points;
        tracing::info!(
            user_id = %user,
            item_id,
            unique_id = %bought.unique_id,
            price,
            balance,
            "Item bought"
        );
        self.events.emit(ReconcilerEvent::PointsSpent {
            item_id,
            price,
            balance,
        });
        Ok(bought)
    }

    /// Sells one purchased instance back for half its price (rounded down)
    ///
    /// Only the instance with `unique_id` is removed. Points and storage are
    /// written together; a failed write restores both. Returns the amount
    /// refunded.
    pub async fn sell_item(&mut self, unique_id: &str) -> ReconcileResult<i64> {
        let name = self
            .state
            .storage_item(unique_id)
            .map(|s| s.item.name.clone());
        let result = self.try_sell_item(unique_id).await;
        self.report("sell_item", result, |amount| {
            name.map(|name| format!("Sold {} for {} points", name, amount))
        })
    }

    async fn try_sell_item(&mut self, unique_id: &str) -> ReconcileResult<i64> {
        let user = self.require_user()?;

        let amount = self
            .state
            .storage_item(unique_id)
            .map(|s| s.item.sell_price())
            .ok_or_else(|| ReconcileError::not_found(EntityKind::StorageItem, unique_id))?;
        let balance = self.credited(amount)?;

        let sold = unique_id.to_string();
        self.commit(
            &user,
            "sell_item",
            Persist::PointsAndStorage,
            FailurePolicy::Rollback,
            move |s| {
                s.points = balance;
                s.storage_items.retain(|i| i.unique_id != sold);
            },
        )
        .await?;

        tracing::info!(user_id = %user, unique_id, amount, balance, "Item sold");
        self.events.emit(ReconcilerEvent::PointsRefunded {
            unique_id: unique_id.to_string(),
            amount,
            balance,
        });
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::error::ReconcileError;
    use crate::events::ReconcilerEvent;
    use questboard_shared::models::{
        ShopItem, ShopItemDraft, ShopItemPatch, DEFAULT_POINTS, MAX_POINTS,
    };

    #[tokio::test]
    async fn test_add_shop_item() {
        let mut h = started().await;

        let item = h
            .reconciler
            .add_shop_item(ShopItemDraft::new(" Snack ", 30).with_description("Something small"))
            .await
            .unwrap();

        assert_eq!(item.name, "Snack");
        assert!(item.id > 2);
        assert_eq!(h.reconciler.state().shop_items.len(), 3);
    }

    #[tokio::test]
    async fn test_add_shop_item_validation() {
        let mut h = started().await;

        let free = h.reconciler.add_shop_item(ShopItemDraft::new("Snack", 0)).await;
        assert!(matches!(free, Err(ReconcileError::InvalidInput(_))));

        let dup = h
            .reconciler
            .add_shop_item(ShopItemDraft::new("1 hour youtube", 10))
            .await;
        assert!(matches!(dup, Err(ReconcileError::DuplicateName { .. })));

        assert_eq!(h.reconciler.state().shop_items, ShopItem::defaults());
    }

    #[tokio::test]
    async fn test_add_shop_item_failure_rolls_back() {
        let mut h = started().await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.add_shop_item(ShopItemDraft::new("Snack", 30)).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().shop_items, ShopItem::defaults());
    }

    #[tokio::test]
    async fn test_update_shop_item() {
        let mut h = started().await;
        let patch = ShopItemPatch {
            price: Some(150),
            ..Default::default()
        };

        let updated = h.reconciler.update_shop_item(1, patch).await.unwrap();
        assert_eq!(updated.price, 150);

        let rename = ShopItemPatch {
            name: Some("2 hour movie".to_string()),
            ..Default::default()
        };
        let dup = h.reconciler.update_shop_item(1, rename).await;
        assert!(matches!(dup, Err(ReconcileError::DuplicateName { .. })));
    }

    #[tokio::test]
    async fn test_update_shop_item_failure_reloads() {
        let mut h = started().await;
        h.edit_remote(|d| {
            for item in d.shop_items.iter_mut().flatten() {
                if item.id == 1 {
                    item.price = 120;
                }
            }
        })
        .await;
        h.store.fail_next_updates(1);

        let patch = ShopItemPatch {
            price: Some(999),
            ..Default::default()
        };
        let result = h.reconciler.update_shop_item(1, patch).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().shop_item(1).unwrap().price, 120);
    }

    #[tokio::test]
    async fn test_add_shop_item_rejects_huge_price() {
        let mut h = started().await;

        let result = h
            .reconciler
            .add_shop_item(ShopItemDraft::new("Island", MAX_POINTS + 1))
            .await;

        assert!(matches!(result, Err(ReconcileError::InvalidInput(_))));
        assert_eq!(h.reconciler.state().shop_items, ShopItem::defaults());
    }

    #[tokio::test]
    async fn test_delete_shop_item() {
        let mut h = started().await;

        assert!(h.reconciler.delete_shop_item(2).await.unwrap());
        assert!(h.reconciler.state().shop_item(2).is_none());
        assert!(!h.reconciler.delete_shop_item(2).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_shop_item_failure_reloads() {
        let mut h = started().await;
        h.edit_remote(|d| {
            for item in d.shop_items.iter_mut().flatten() {
                item.description = "from the store".to_string();
            }
        })
        .await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.delete_shop_item(2).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        let restored = h.reconciler.state().shop_item(2).unwrap();
        assert_eq!(restored.description, "from the store");
    }

    #[tokio::test]
    async fn test_buy_then_sell() {
        let mut h = started().await;

        let first = h.reconciler.buy_item(2).await.unwrap();
        let second = h.reconciler.buy_item(2).await.unwrap();
        assert_ne!(first.unique_id, second.unique_id);
        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS - 400);

        let refund = h.reconciler.sell_item(&first.unique_id).await.unwrap();
        assert_eq!(refund, 100);
        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS - 400 + 100);

        let remaining = &h.reconciler.state().storage_items;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].unique_id, second.unique_id);

        let stored = h.store.document(&Harness::user()).await.unwrap();
        assert_eq!(stored.points, Some(DEFAULT_POINTS - 300));
        assert_eq!(stored.storage_items.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_buy_insufficient_points() {
        let mut h = started().await;
        h.reconciler.buy_item(2).await.unwrap();
        h.reconciler.buy_item(2).await.unwrap();

        let result = h.reconciler.buy_item(2).await;

        assert!(matches!(
            result,
            Err(ReconcileError::InsufficientPoints {
                needed: 200,
                available: 100
            })
        ));
        assert_eq!(h.reconciler.state().storage_items.len(), 2);
    }

    #[tokio::test]
    async fn test_buy_failure_rolls_back() {
        let mut h = started().await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.buy_item(1).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS);
        assert!(h.reconciler.state().storage_items.is_empty());
    }

    #[tokio::test]
    async fn test_buy_and_sell_events() {
        let mut h = started().await;
        let bought = h.reconciler.buy_item(1).await.unwrap();
        h.reconciler.sell_item(&bought.unique_id).await.unwrap();

        let events = h.drain_events();
        assert!(events.contains(&ReconcilerEvent::PointsSpent {
            item_id: 1,
            price: 100,
            balance: DEFAULT_POINTS - 100,
        }));
        assert!(events.contains(&ReconcilerEvent::PointsRefunded {
            unique_id: bought.unique_id.clone(),
            amount: 50,
            balance: DEFAULT_POINTS - 50,
        }));
    }

    #[tokio::test]
    async fn test_sell_failure_rolls_back() {
        let mut h = started().await;
        let bought = h.reconciler.buy_item(1).await.unwrap();
        h.edit_remote(|d| d.points = Some(999)).await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.sell_item(&bought.unique_id).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS - 100);
        assert_eq!(h.reconciler.state().storage_items, vec![bought]);
    }

    #[tokio::test]
    async fn test_sell_rejects_balance_overflow() {
        let mut h = started().await;
        let bought = h.reconciler.buy_item(2).await.unwrap();
        h.edit_remote(|d| d.points = Some(i64::MAX - 10)).await;
        h.reconciler.reload().await.unwrap();
        let writes = h.store.update_calls();

        let result = h.reconciler.sell_item(&bought.unique_id).await;

        assert!(matches!(result, Err(ReconcileError::InvalidInput(_))));
        assert_eq!(h.reconciler.state().points, i64::MAX - 10);
        assert_eq!(h.reconciler.state().storage_items.len(), 1);
        assert_eq!(h.store.update_calls(), writes);
    }

    #[tokio::test]
    async fn test_sell_unknown_instance() {
        let mut h = started().await;
        let result = h.reconciler.sell_item("1-missing").await;
        assert!(matches!(result, Err(ReconcileError::NotFound { .. })));
    }
}
