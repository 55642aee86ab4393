/// Category operations

use super::commit::{FailurePolicy, Persist};
use super::Reconciler;
use crate::error::{EntityKind, ReconcileError, ReconcileResult};
use questboard_shared::models::{Category, StateField};

impl Reconciler {
    /// Adds a category named `name`
    ///
    /// The id is derived from the name (lowercased, whitespace runs replaced
    /// by `-`).
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the name is blank
    /// - `DuplicateName` if an existing category has the same name (ignoring
    ///   case) or the same derived id
    pub async fn add_category(&mut self, name: &str) -> ReconcileResult<Category> {
        let result = self.try_add_category(name).await;
        self.report("add_category", result, |_| {
            Some("Category added successfully!".to_string())
        })
    }

    async fn try_add_category(&mut self, name: &str) -> ReconcileResult<Category> {
        let user = self.require_user()?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ReconcileError::InvalidInput(
                "category name cannot be empty".to_string(),
            ));
        }
        if self.state.categories.iter().any(|c| c.collides_with(name)) {
            return Err(ReconcileError::duplicate(EntityKind::Category, name));
        }

        let category = Category::from_name(name);
        let added = category.clone();
        self.commit(&user, "add_category", Persist::Categories, FailurePolicy::Keep, move |s| {
            s.categories.push(added)
        })
        .await?;

        tracing::info!(user_id = %user, category_id = %category.id, "Category added");
        Ok(category)
    }

    /// Deletes the category with `id`
    ///
    /// Returns `false` without touching the store when no such category
    /// exists. A failed write reloads categories from the store.
    ///
    /// # Errors
    ///
    /// `CategoryInUse` if any task is filed under the category.
    pub async fn delete_category(&mut self, id: &str) -> ReconcileResult<bool> {
        let result = self.try_delete_category(id).await;
        self.report("delete_category", result, |deleted| {
            deleted.then(|| "Category deleted successfully!".to_string())
        })
    }

    async fn try_delete_category(&mut self, id: &str) -> ReconcileResult<bool> {
        let user = self.require_user()?;

        let tasks = self.state.tasks_in_category(id);
        if tasks > 0 {
            return Err(ReconcileError::CategoryInUse {
                id: id.to_string(),
                tasks,
            });
        }
        if self.state.category(id).is_none() {
            return Ok(false);
        }

        let removed = id.to_string();
        self.commit(
            &user,
            "delete_category",
            Persist::Categories,
            FailurePolicy::Reload(&[StateField::Categories]),
            move |s| s.categories.retain(|c| c.id != removed),
        )
        .await?;

        tracing::info!(user_id = %user, category_id = id, "Category deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::error::ReconcileError;
    use questboard_shared::models::{Category, TaskDraft};

    #[tokio::test]
    async fn test_add_category_derives_id() {
        let mut h = started().await;

        let category = h.reconciler.add_category("  Side   Projects ").await.unwrap();

        assert_eq!(category.id, "side-projects");
        assert_eq!(category.name, "Side   Projects");
        assert_eq!(h.reconciler.state().categories.len(), 4);
        let stored = h.store.document(&Harness::user()).await.unwrap();
        assert_eq!(stored.categories.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_add_category_rejects_duplicates() {
        let mut h = started().await;

        let same_name = h.reconciler.add_category("WORK").await;
        assert!(matches!(same_name, Err(ReconcileError::DuplicateName { .. })));

        let blank = h.reconciler.add_category("   ").await;
        assert!(matches!(blank, Err(ReconcileError::InvalidInput(_))));

        assert_eq!(h.reconciler.state().categories, Category::defaults());
    }

    #[tokio::test]
    async fn test_delete_category_in_use() {
        let mut h = started().await;
        h.reconciler
            .add_task(TaskDraft::new("Report", 20).in_category("work"))
            .await
            .unwrap();

        let result = h.reconciler.delete_category("work").await;
        assert!(matches!(
            result,
            Err(ReconcileError::CategoryInUse { tasks: 1, .. })
        ));
        assert!(h.reconciler.state().category("work").is_some());
    }

    #[tokio::test]
    async fn test_delete_empty_category() {
        let mut h = started().await;

        assert!(h.reconciler.delete_category("personal").await.unwrap());
        assert!(h.reconciler.state().category("personal").is_none());

        // Second delete is a no-op
        let before = h.store.update_calls();
        assert!(!h.reconciler.delete_category("personal").await.unwrap());
        assert_eq!(h.store.update_calls(), before);
    }

    #[tokio::test]
    async fn test_delete_category_failure_reloads() {
        let mut h = started().await;
        h.edit_remote(|d| {
            d.categories
                .get_or_insert_with(Vec::new)
                .push(Category::from_name("Errands"))
        })
        .await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.delete_category("personal").await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert!(h.reconciler.state().category("personal").is_some());
        assert!(h.reconciler.state().category("errands").is_some());
    }

    #[tokio::test]
    async fn test_add_category_failure_keeps_local() {
        let mut h = started().await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.add_category("Health").await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert!(h.reconciler.state().category("health").is_some());
    }
}
