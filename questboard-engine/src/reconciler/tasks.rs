/// Task operations

use super::commit::{FailurePolicy, Persist};
use super::Reconciler;
use crate::config::CompletionPolicy;
use crate::error::{EntityKind, ReconcileError, ReconcileResult};
use crate::events::ReconcilerEvent;
use chrono::Utc;
use questboard_shared::models::{StateField, Task, TaskDraft, TaskPatch};
use validator::Validate;

const RELOAD_TASKS: &[StateField] = &[StateField::Tasks, StateField::Categories];
const RELOAD_TASKS_AND_POINTS: &[StateField] =
    &[StateField::Tasks, StateField::Categories, StateField::Points];

impl Reconciler {
    /// Adds a task
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the name is blank or points are not positive
    /// - `DuplicateName` if a task with the same name (ignoring case) exists
    /// - `Persistence` if the write fails; the task stays in the local list
    pub async fn add_task(&mut self, draft: TaskDraft) -> ReconcileResult<Task> {
        let result = self.try_add_task(draft).await;
        self.report("add_task", result, |_| Some("Task added successfully!".to_string()))
    }

    async fn try_add_task(&mut self, mut draft: TaskDraft) -> ReconcileResult<Task> {
        let user = self.require_user()?;

        draft.name = draft.name.trim().to_string();
        draft.validate()?;
        if self.state.tasks.iter().any(|t| t.has_name(&draft.name)) {
            return Err(ReconcileError::duplicate(EntityKind::Task, &draft.name));
        }

        let id = self.ids.next_id(self.state.tasks.iter().map(|t| t.id));
        let task = Task::from_draft(id, draft, Utc::now());

        let added = task.clone();
        self.commit(&user, "add_task", Persist::Tasks, FailurePolicy::Keep, move |s| {
            s.tasks.push(added)
        })
        .await?;

        tracing::info!(user_id = %user, task_id = task.id, name = %task.name, "Task added");
        Ok(task)
    }

    /// Applies `patch` to the task with `id`
    ///
    /// A failed write restores the previous version of the task.
    pub async fn update_task(&mut self, id: i64, patch: TaskPatch) -> ReconcileResult<Task> {
        let result = self.try_update_task(id, patch).await;
        self.report("update_task", result, |_| {
            Some("Task updated successfully!".to_string())
        })
    }

    async fn try_update_task(&mut self, id: i64, patch: TaskPatch) -> ReconcileResult<Task> {
        let user = self.require_user()?;

        let current = self
            .state
            .task(id)
            .ok_or_else(|| ReconcileError::not_found(EntityKind::Task, id))?;
        let mut updated = patch.apply_to(current);
        updated.name = updated.name.trim().to_string();
        updated.validate()?;

        let replacement = updated.clone();
        self.commit(&user, "update_task", Persist::Tasks, FailurePolicy::Rollback, move |s| {
            if let Some(task) = s.tasks.iter_mut().find(|t| t.id == id) {
                *task = replacement;
            }
        })
        .await?;

        Ok(updated)
    }

    /// Deletes the task with `id`
    ///
    /// Returns `false` without touching the store when no such task exists.
    /// A failed write reloads tasks and categories from the store.
    pub async fn delete_task(&mut self, id: i64) -> ReconcileResult<bool> {
        let result = self.try_delete_task(id).await;
        self.report("delete_task", result, |deleted| {
            deleted.then(|| "Task deleted successfully!".to_string())
        })
    }

    async fn try_delete_task(&mut self, id: i64) -> ReconcileResult<bool> {
        let user = self.require_user()?;

        if self.state.task(id).is_none() {
            return Ok(false);
        }

        self.commit(
            &user,
            "delete_task",
            Persist::Tasks,
            FailurePolicy::Reload(RELOAD_TASKS),
            move |s| s.tasks.retain(|t| t.id != id),
        )
        .await?;

        tracing::info!(user_id = %user, task_id = id, "Task deleted");
        Ok(true)
    }

    /// Flips the completion flag of the task with `id`
    ///
    /// Completing a task credits its points. Un-completing follows the
    /// configured `CompletionPolicy`: by default the points stay earned.
    /// Tasks and points are written together; a failed write reloads tasks,
    /// categories and points from the store.
    pub async fn toggle_task_completion(&mut self, id: i64) -> ReconcileResult<Task> {
        let result = self.try_toggle_task_completion(id).await;
        self.report("toggle_task_completion", result, |task| {
            if task.completed {
                Some(format!("Task completed! +{} points", task.points))
            } else {
                Some("Task marked as not completed".to_string())
            }
        })
    }

    async fn try_toggle_task_completion(&mut self, id: i64) -> ReconcileResult<Task> {
        let user = self.require_user()?;

        let task = self
            .state
            .task(id)
            .cloned()
            .ok_or_else(|| ReconcileError::not_found(EntityKind::Task, id))?;

        let completing = !task.completed;
        let delta = if completing {
            task.points
        } else {
            match self.config.completion_policy {
                CompletionPolicy::KeepEarned => 0,
                CompletionPolicy::Revoke => -task.points.min(self.state.points),
            }
        };
        let balance = self.credited(delta)?;

        self.commit(
            &user,
            "toggle_task_completion",
            Persist::TasksAndPoints,
            FailurePolicy::Reload(RELOAD_TASKS_AND_POINTS),
            move |s| {
                if let Some(task) = s.tasks.iter_mut().find(|t| t.id == id) {
                    task.completed = completing;
                }
                s.points = balance;
            },
        )
        .await?;

        if delta > 0 {
            tracing::info!(user_id = %user, task_id = id, points = delta, balance, "Points earned");
            self.events.emit(ReconcilerEvent::PointsEarned {
                task_id: id,
                points: delta,
                balance,
            });
        } else if delta < 0 {
            tracing::info!(user_id = %user, task_id = id, points = -delta, balance, "Points revoked");
            self.events.emit(ReconcilerEvent::PointsRevoked {
                task_id: id,
                points: -delta,
                balance,
            });
        }

        Ok(Task {
            completed: completing,
            ..task
        })
    }

    /// Files the task under another category
    ///
    /// Returns `false` without touching the store when the category does not
    /// exist or the task is already in it. A failed write reloads tasks and
    /// categories from the store.
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no task with `task_id`.
    pub async fn move_task_to_category(
        &mut self,
        task_id: i64,
        category_id: &str,
    ) -> ReconcileResult<bool> {
        let category_name = self.state.category(category_id).map(|c| c.name.clone());
        let result = self.try_move_task(task_id, category_id).await;
        self.report("move_task_to_category", result, |moved| {
            match (*moved, category_name) {
                (true, Some(name)) => Some(format!("Task moved to {}", name)),
                _ => None,
            }
        })
    }

    async fn try_move_task(&mut self, task_id: i64, category_id: &str) -> ReconcileResult<bool> {
        let user = self.require_user()?;

        if self.state.category(category_id).is_none() {
            tracing::debug!(user_id = %user, task_id, category_id, "Move to unknown category ignored");
            return Ok(false);
        }

        let task = self
            .state
            .task(task_id)
            .ok_or_else(|| ReconcileError::not_found(EntityKind::Task, task_id))?;
        if task.category == category_id {
            return Ok(false);
        }

        let category = category_id.to_string();
        self.commit(
            &user,
            "move_task_to_category",
            Persist::Tasks,
            FailurePolicy::Reload(RELOAD_TASKS),
            move |s| {
                if let Some(task) = s.tasks.iter_mut().find(|t| t.id == task_id) {
                    task.category = category;
                }
            },
        )
        .await?;

        tracing::info!(user_id = %user, task_id, category_id, "Task moved");
        Ok(true)
    }

    /// Replaces the whole task list
    ///
    /// A failed write restores the previous list.
    pub async fn save_tasks(&mut self, tasks: Vec<Task>) -> ReconcileResult<()> {
        let result = self.try_save_tasks(tasks).await;
        self.report("save_tasks", result, |_| None)
    }

    async fn try_save_tasks(&mut self, tasks: Vec<Task>) -> ReconcileResult<()> {
        let user = self.require_user()?;

        for task in &tasks {
            task.validate()?;
        }

        self.commit(&user, "save_tasks", Persist::Tasks, FailurePolicy::Rollback, move |s| {
            s.tasks = tasks
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::config::{CompletionPolicy, ReconcilerConfig};
    use crate::error::ReconcileError;
    use crate::events::{NoticeLevel, ReconcilerEvent};
    use chrono::Utc;
    use questboard_shared::models::{
        Category, Task, TaskDraft, TaskPatch, DEFAULT_CATEGORY_ID, DEFAULT_POINTS, MAX_POINTS,
    };
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_add_task_defaults() {
        let mut h = started().await;

        let task = h.reconciler.add_task(TaskDraft::new("  Exercise ", 50)).await.unwrap();

        assert_eq!(task.name, "Exercise");
        assert_eq!(task.category, DEFAULT_CATEGORY_ID);
        assert!(!task.completed);
        assert_eq!(h.reconciler.state().tasks, vec![task.clone()]);

        let stored = h.store.document(&Harness::user()).await.unwrap();
        assert_eq!(stored.tasks.unwrap(), vec![task]);
    }

    #[tokio::test]
    async fn test_add_task_ids_are_unique() {
        let mut h = started().await;
        for i in 0..20 {
            h.reconciler
                .add_task(TaskDraft::new(format!("Task {}", i), 5))
                .await
                .unwrap();
        }

        let ids: HashSet<i64> = h.reconciler.state().tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_add_task_rejects_invalid_input() {
        let mut h = started().await;

        let blank = h.reconciler.add_task(TaskDraft::new("   ", 10)).await;
        assert!(matches!(blank, Err(ReconcileError::InvalidInput(_))));

        let zero = h.reconciler.add_task(TaskDraft::new("Read", 0)).await;
        assert!(matches!(zero, Err(ReconcileError::InvalidInput(_))));

        let huge = h.reconciler.add_task(TaskDraft::new("Read", i64::MAX)).await;
        assert!(matches!(huge, Err(ReconcileError::InvalidInput(_))));

        assert!(h.reconciler.state().tasks.is_empty());
        assert_eq!(h.store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_task_failure_keeps_local_task() {
        let mut h = started().await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.add_task(TaskDraft::new("Read", 10)).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().tasks.len(), 1);
        let stored = h.store.document(&Harness::user()).await.unwrap();
        assert!(stored.tasks.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_task_failure_rolls_back() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Read", 10)).await.unwrap();
        h.store.fail_next_updates(1);

        let patch = TaskPatch {
            name: Some("Read a book".to_string()),
            ..Default::default()
        };
        let result = h.reconciler.update_task(task.id, patch).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().task(task.id).unwrap().name, "Read");
    }

    #[tokio::test]
    async fn test_update_task_validation() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Read", 10)).await.unwrap();

        let missing = h.reconciler.update_task(task.id + 1, TaskPatch::default()).await;
        assert!(matches!(missing, Err(ReconcileError::NotFound { .. })));

        let negative = TaskPatch {
            points: Some(-1),
            ..Default::default()
        };
        let result = h.reconciler.update_task(task.id, negative).await;
        assert!(matches!(result, Err(ReconcileError::InvalidInput(_))));

        let zero = TaskPatch {
            points: Some(0),
            ..Default::default()
        };
        let updated = h.reconciler.update_task(task.id, zero).await.unwrap();
        assert_eq!(updated.points, 0);
    }

    #[tokio::test]
    async fn test_delete_task_absent_is_noop() {
        let mut h = started().await;
        let before = h.store.update_calls();

        assert!(!h.reconciler.delete_task(12345).await.unwrap());
        assert_eq!(h.store.update_calls(), before);
    }

    #[tokio::test]
    async fn test_delete_task_failure_reloads_from_store() {
        let mut h = started().await;
        h.reconciler.add_task(TaskDraft::new("Read", 10)).await.unwrap();
        let task = h.reconciler.add_task(TaskDraft::new("Write", 10)).await.unwrap();
        let remote = Task::from_draft(7, TaskDraft::new("Remote", 5), Utc::now());
        let remote_tasks = vec![remote, task.clone()];
        let copy = remote_tasks.clone();
        h.edit_remote(move |d| {
            d.tasks = Some(copy);
            d.categories.get_or_insert_with(Vec::new).push(Category::from_name("Errands"));
        })
        .await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.delete_task(task.id).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().tasks, remote_tasks);
        assert!(h.reconciler.state().category("errands").is_some());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_optimistic_delete() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Read", 10)).await.unwrap();
        let reads = h.store.get_calls();
        h.store.fail_next_updates(1);
        h.store.fail_next_gets(1);

        let result = h.reconciler.delete_task(task.id).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.store.get_calls(), reads + 1);
        assert!(h.reconciler.state().tasks.is_empty());
        // The store still has the task
        let stored = h.store.document(&Harness::user()).await.unwrap();
        assert_eq!(stored.tasks.unwrap(), vec![task]);
    }

    #[tokio::test]
    async fn test_toggle_twice_keeps_earned_points() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Exercise", 50)).await.unwrap();

        let done = h.reconciler.toggle_task_completion(task.id).await.unwrap();
        assert!(done.completed);
        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS + 50);

        let undone = h.reconciler.toggle_task_completion(task.id).await.unwrap();
        assert!(!undone.completed);
        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS + 50);

        let stored = h.store.document(&Harness::user()).await.unwrap();
        assert_eq!(stored.points, Some(DEFAULT_POINTS + 50));
        assert!(!stored.tasks.unwrap()[0].completed);
    }

    #[tokio::test]
    async fn test_toggle_with_revoke_policy() {
        let config = ReconcilerConfig::default().with_completion_policy(CompletionPolicy::Revoke);
        let mut h = started_with(config).await;
        let task = h.reconciler.add_task(TaskDraft::new("Exercise", 50)).await.unwrap();

        h.reconciler.toggle_task_completion(task.id).await.unwrap();
        h.reconciler.toggle_task_completion(task.id).await.unwrap();

        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS);
        let revoked = h
            .drain_events()
            .into_iter()
            .any(|e| matches!(e, ReconcilerEvent::PointsRevoked { points: 50, .. }));
        assert!(revoked);
    }

    #[tokio::test]
    async fn test_toggle_emits_points_earned() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Exercise", 50)).await.unwrap();
        h.drain_events();

        h.reconciler.toggle_task_completion(task.id).await.unwrap();

        let events = h.drain_events();
        assert!(events.contains(&ReconcilerEvent::PointsEarned {
            task_id: task.id,
            points: 50,
            balance: DEFAULT_POINTS + 50,
        }));
        let notice = events.iter().find_map(|e| e.as_notification()).unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn test_toggle_failure_reloads_points() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Exercise", 50)).await.unwrap();
        h.edit_remote(|d| d.points = Some(999)).await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.toggle_task_completion(task.id).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().points, 999);
        assert!(!h.reconciler.state().task(task.id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_toggle_rejects_balance_overflow() {
        let mut h = started().await;
        // Written by an older client, before points were bounded
        let legacy = Task::from_draft(9, TaskDraft::new("Huge", MAX_POINTS), Utc::now());
        let legacy = Task {
            points: i64::MAX,
            ..legacy
        };
        h.edit_remote(move |d| d.tasks = Some(vec![legacy])).await;
        h.reconciler.reload().await.unwrap();
        let writes = h.store.update_calls();

        let result = h.reconciler.toggle_task_completion(9).await;

        assert!(matches!(result, Err(ReconcileError::InvalidInput(_))));
        assert_eq!(h.reconciler.state().points, DEFAULT_POINTS);
        assert!(!h.reconciler.state().task(9).unwrap().completed);
        assert_eq!(h.store.update_calls(), writes);
    }

    #[tokio::test]
    async fn test_move_task() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Report", 20)).await.unwrap();

        assert!(h.reconciler.move_task_to_category(task.id, "work").await.unwrap());
        assert_eq!(h.reconciler.state().task(task.id).unwrap().category, "work");

        // Already there
        let before = h.store.update_calls();
        assert!(!h.reconciler.move_task_to_category(task.id, "work").await.unwrap());
        assert_eq!(h.store.update_calls(), before);
    }

    #[tokio::test]
    async fn test_move_to_unknown_category_is_noop() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Report", 20)).await.unwrap();
        let before = h.store.update_calls();

        let moved = h.reconciler.move_task_to_category(task.id, "nowhere").await.unwrap();

        assert!(!moved);
        assert_eq!(h.reconciler.state().task(task.id).unwrap().category, DEFAULT_CATEGORY_ID);
        assert_eq!(h.store.update_calls(), before);
    }

    #[tokio::test]
    async fn test_move_failure_reloads_from_store() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Report", 20)).await.unwrap();
        let id = task.id;
        h.edit_remote(move |d| {
            for t in d.tasks.iter_mut().flatten() {
                if t.id == id {
                    t.category = "personal".to_string();
                }
            }
        })
        .await;
        h.store.fail_next_updates(1);

        let result = h.reconciler.move_task_to_category(id, "work").await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().task(id).unwrap().category, "personal");
    }

    #[tokio::test]
    async fn test_move_missing_task() {
        let mut h = started().await;
        let result = h.reconciler.move_task_to_category(99, "work").await;
        assert!(matches!(result, Err(ReconcileError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_save_tasks_replaces_list() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Read", 10)).await.unwrap();
        let mut renamed = task.clone();
        renamed.name = "Read more".to_string();

        h.reconciler.save_tasks(vec![renamed.clone()]).await.unwrap();

        assert_eq!(h.reconciler.state().tasks, vec![renamed.clone()]);
        let stored = h.store.document(&Harness::user()).await.unwrap();
        assert_eq!(stored.tasks.unwrap(), vec![renamed]);
    }

    #[tokio::test]
    async fn test_save_tasks_failure_rolls_back() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Read", 10)).await.unwrap();
        h.edit_remote(|d| d.tasks = Some(Vec::new())).await;
        h.store.fail_next_updates(1);

        let mut renamed = task.clone();
        renamed.name = "Read more".to_string();
        let result = h.reconciler.save_tasks(vec![renamed]).await;

        assert!(matches!(result, Err(ReconcileError::Persistence(_))));
        assert_eq!(h.reconciler.state().tasks, vec![task]);
    }
}
