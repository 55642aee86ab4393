/// Optimistic apply, persist, recover
///
/// Every mutating operation goes through `Reconciler::commit`:
///
/// ```text
/// commit(persist, policy, mutate)
///   ├─> remember prior snapshot (Rollback only)
///   ├─> mutate local state, publish snapshot
///   ├─> write the affected fields (bounded by the store timeout)
///   └─> write failed?
///         ├─> Keep        leave the optimistic state standing
///         ├─> Rollback    restore the prior snapshot
///         └─> Reload(fs)  re-read fields `fs` from the store; if that
///                         fails too, keep the optimistic state
/// ```
///
/// The write error is returned to the caller in every case.

use super::Reconciler;
use crate::error::{ReconcileError, ReconcileResult};
use questboard_shared::models::{StateField, UserId, UserState};
use questboard_shared::store::StoreResult;

/// What to do with the local snapshot when a write fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep the optimistic change
    Keep,

    /// Restore the snapshot taken before the change
    Rollback,

    /// Replace the named fields with the store's copy
    Reload(&'static [StateField]),
}

/// Which fields a commit writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Persist {
    Tasks,
    Categories,
    ShopItems,
    StorageItems,
    TasksAndPoints,
    PointsAndStorage,
}

impl Reconciler {
    pub(super) async fn commit<F>(
        &mut self,
        user: &UserId,
        action: &'static str,
        persist: Persist,
        policy: FailurePolicy,
        mutate: F,
    ) -> ReconcileResult<()>
    where
        F: FnOnce(&mut UserState),
    {
        let prior = match policy {
            FailurePolicy::Rollback => Some(self.state.clone()),
            _ => None,
        };

        mutate(&mut self.state);
        self.publish();

        match self.persist(user, persist).await {
            Ok(()) => {
                tracing::debug!(user_id = %user, action, "Committed change");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %user,
                    action,
                    policy = ?policy,
                    error = %e,
                    "Write failed, recovering local state"
                );
                self.recover(user, action, policy, prior).await;
                Err(ReconcileError::Persistence(e))
            }
        }
    }

    async fn persist(&self, user: &UserId, persist: Persist) -> StoreResult<()> {
        let state = &self.state;
        match persist {
            Persist::Tasks => self.repo.save_tasks(user, &state.tasks).await,
            Persist::Categories => self.repo.save_categories(user, &state.categories).await,
            Persist::ShopItems => self.repo.save_shop_items(user, &state.shop_items).await,
            Persist::StorageItems => {
                self.repo
                    .save_storage_items(user, &state.storage_items)
                    .await
            }
            Persist::TasksAndPoints => {
                self.repo
                    .save_tasks_and_points(user, &state.tasks, state.points)
                    .await
            }
            Persist::PointsAndStorage => {
                self.repo
                    .save_points_and_storage(user, state.points, &state.storage_items)
                    .await
            }
        }
    }

    async fn recover(
        &mut self,
        user: &UserId,
        action: &'static str,
        policy: FailurePolicy,
        prior: Option<UserState>,
    ) {
        match policy {
            FailurePolicy::Keep => {}
            FailurePolicy::Rollback => {
                if let Some(prior) = prior {
                    self.state = prior;
                    self.publish();
                }
            }
            FailurePolicy::Reload(fields) => match self.repo.load_fields(user, fields).await {
                Ok(document) => {
                    tracing::info!(user_id = %user, action, fields = ?fields, "Reloaded fields from store");
                    self.state.apply_document(document);
                    self.publish();
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %user,
                        action,
                        error = %e,
                        "Reload failed, keeping optimistic state"
                    );
                }
            },
        }
    }
}
