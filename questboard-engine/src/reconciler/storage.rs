/// Storage operations: using purchased items

use super::commit::{FailurePolicy, Persist};
use super::Reconciler;
use crate::error::{EntityKind, ReconcileError, ReconcileResult};

/// Result of `toggle_item_use`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemUse {
    /// The instance is now marked in use
    Started,

    /// The instance was in use and has been used up (removed)
    Consumed,
}

impl Reconciler {
    /// Marks a purchased instance as in use, or consumes it if it already is
    ///
    /// Only the local snapshot changes; call `save_storage` to persist.
    pub fn toggle_item_use(&mut self, unique_id: &str) -> ReconcileResult<ItemUse> {
        let name = self
            .state
            .storage_item(unique_id)
            .map(|s| s.item.name.clone());
        let result = self.try_toggle_item_use(unique_id);
        self.report("toggle_item_use", result, |outcome| {
            name.map(|name| match outcome {
                ItemUse::Started => format!("Now using {}", name),
                ItemUse::Consumed => format!("Used up {}", name),
            })
        })
    }

    fn try_toggle_item_use(&mut self, unique_id: &str) -> ReconcileResult<ItemUse> {
        let user = self.require_user()?;

        let index = self
            .state
            .storage_items
            .iter()
            .position(|s| s.unique_id == unique_id)
            .ok_or_else(|| ReconcileError::not_found(EntityKind::StorageItem, unique_id))?;

        let outcome = if self.state.storage_items[index].in_use {
            self.state.storage_items.remove(index);
            ItemUse::Consumed
        } else {
            self.state.storage_items[index].in_use = true;
            ItemUse::Started
        };
        self.publish();

        tracing::debug!(user_id = %user, unique_id, outcome = ?outcome, "Toggled item use");
        Ok(outcome)
    }

    /// Writes the current storage list
    ///
    /// On failure the local list is left as it is.
    pub async fn save_storage(&mut self) -> ReconcileResult<()> {
        let result = self.try_save_storage().await;
        self.report("save_storage", result, |_| None)
    }

    async fn try_save_storage(&mut self) -> ReconcileResult<()> {
        let user = self.require_user()?;
        self.commit(
            &user,
            "save_storage",
            Persist::StorageItems,
            FailurePolicy::Keep,
            |_| {},
        )
        .await
    }
}
