/// Drag-and-drop reassignment
///
/// The board renders one column per category. When the user drops a task
/// card onto a column, the UI reports a `DragEvent`; the handler turns it
/// into a `move_task_to_category` call.
///
/// Everything that is not an actual move is reported as
/// `DragOutcome::Ignored` rather than an error: a cancelled drag, a drop while
/// signed out, a card whose task was deleted in the meantime, a column that
/// no longer exists or a drop back onto the same column. Only store failures
/// are returned as errors.
///
/// # Example
///
/// ```no_run
/// use questboard_engine::drag::{DragEvent, DragOutcome, DragReassignmentHandler, DropTarget};
/// use questboard_engine::Reconciler;
///
/// # async fn example(reconciler: &mut Reconciler) -> Result<(), Box<dyn std::error::Error>> {
/// let event = DragEvent {
///     dragged_id: "1718000000000".to_string(),
///     source: DropTarget::new("general", 0),
///     destination: Some(DropTarget::new("work", 2)),
/// };
///
/// match DragReassignmentHandler::new().handle(reconciler, event).await? {
///     DragOutcome::Moved { task_id, category } => println!("moved {} to {}", task_id, category),
///     DragOutcome::Ignored(reason) => println!("ignored: {}", reason),
/// }
/// # Ok(())
/// # }
/// ```

use crate::error::{ReconcileError, ReconcileResult};
use crate::reconciler::Reconciler;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A column position on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    /// Category id of the column
    pub category_id: String,

    /// Position within the column
    pub index: usize,
}

impl DropTarget {
    pub fn new(category_id: impl Into<String>, index: usize) -> Self {
        DropTarget {
            category_id: category_id.into(),
            index,
        }
    }
}

/// Completed drag reported by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragEvent {
    /// Task id as rendered on the card
    pub dragged_id: String,
    pub source: DropTarget,

    /// `None` when the card was dropped outside any column
    pub destination: Option<DropTarget>,
}

/// Why a drag did not move anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    Cancelled,
    NoSession,
    InvalidTaskId,
    TaskMissing,
    UnknownCategory,
    SameCategory,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::Cancelled => write!(f, "drag cancelled"),
            IgnoreReason::NoSession => write!(f, "no active session"),
            IgnoreReason::InvalidTaskId => write!(f, "invalid task id"),
            IgnoreReason::TaskMissing => write!(f, "task no longer exists"),
            IgnoreReason::UnknownCategory => write!(f, "unknown category"),
            IgnoreReason::SameCategory => write!(f, "task already in category"),
        }
    }
}

/// Result of handling a drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Moved { task_id: i64, category: String },
    Ignored(IgnoreReason),
}

/// Turns drag events into category moves
#[derive(Debug, Clone, Copy, Default)]
pub struct DragReassignmentHandler;

impl DragReassignmentHandler {
    pub fn new() -> Self {
        DragReassignmentHandler
    }

    /// Applies `event` to `reconciler`
    ///
    /// # Errors
    ///
    /// `ReconcileError::Persistence` if the move could not be written.
    pub async fn handle(
        &self,
        reconciler: &mut Reconciler,
        event: DragEvent,
    ) -> ReconcileResult<DragOutcome> {
        let outcome = self.apply(reconciler, event).await;
        if let Ok(DragOutcome::Ignored(reason)) = &outcome {
            tracing::debug!(reason = %reason, "Drag ignored");
        }
        outcome
    }

    async fn apply(
        &self,
        reconciler: &mut Reconciler,
        event: DragEvent,
    ) -> ReconcileResult<DragOutcome> {
        let Some(destination) = event.destination else {
            return Ok(DragOutcome::Ignored(IgnoreReason::Cancelled));
        };
        if !reconciler.is_active() {
            return Ok(DragOutcome::Ignored(IgnoreReason::NoSession));
        }
        let Ok(task_id) = event.dragged_id.trim().parse::<i64>() else {
            return Ok(DragOutcome::Ignored(IgnoreReason::InvalidTaskId));
        };

        let state = reconciler.state();
        if state.category(&destination.category_id).is_none() {
            return Ok(DragOutcome::Ignored(IgnoreReason::UnknownCategory));
        }
        match state.task(task_id) {
            None => return Ok(DragOutcome::Ignored(IgnoreReason::TaskMissing)),
            Some(task) if task.category == destination.category_id => {
                return Ok(DragOutcome::Ignored(IgnoreReason::SameCategory))
            }
            Some(_) => {}
        }

        match reconciler
            .move_task_to_category(task_id, &destination.category_id)
            .await
        {
            Ok(true) => Ok(DragOutcome::Moved {
                task_id,
                category: destination.category_id,
            }),
            Ok(false) => Ok(DragOutcome::Ignored(IgnoreReason::SameCategory)),
            Err(ReconcileError::NotFound { .. }) => {
                Ok(DragOutcome::Ignored(IgnoreReason::TaskMissing))
            }
            Err(ReconcileError::NotAuthenticated) => {
                Ok(DragOutcome::Ignored(IgnoreReason::NoSession))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::testing::*;
    use questboard_shared::models::TaskDraft;

    fn drop_on(task_id: impl ToString, category: &str) -> DragEvent {
        DragEvent {
            dragged_id: task_id.to_string(),
            source: DropTarget::new("general", 0),
            destination: Some(DropTarget::new(category, 0)),
        }
    }

    #[tokio::test]
    async fn test_drag_moves_task() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Report", 20)).await.unwrap();

        let outcome = DragReassignmentHandler::new()
            .handle(&mut h.reconciler, drop_on(task.id, "work"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DragOutcome::Moved {
                task_id: task.id,
                category: "work".to_string()
            }
        );
        assert_eq!(h.reconciler.state().task(task.id).unwrap().category, "work");
    }

    #[tokio::test]
    async fn test_cancelled_drag() {
        let mut h = started().await;
        let event = DragEvent {
            dragged_id: "1".to_string(),
            source: DropTarget::new("general", 0),
            destination: None,
        };

        let outcome = DragReassignmentHandler::new()
            .handle(&mut h.reconciler, event)
            .await
            .unwrap();
        assert_eq!(outcome, DragOutcome::Ignored(IgnoreReason::Cancelled));
    }

    #[tokio::test]
    async fn test_drag_ignores_stale_or_bad_input() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Report", 20)).await.unwrap();
        let handler = DragReassignmentHandler::new();

        let cases = vec![
            (drop_on("not-a-number", "work"), IgnoreReason::InvalidTaskId),
            (drop_on(task.id + 1, "work"), IgnoreReason::TaskMissing),
            (drop_on(task.id, "archive"), IgnoreReason::UnknownCategory),
            (drop_on(task.id, "general"), IgnoreReason::SameCategory),
        ];

        let updates = h.store.update_calls();
        for (event, reason) in cases {
            let outcome = handler.handle(&mut h.reconciler, event).await.unwrap();
            assert_eq!(outcome, DragOutcome::Ignored(reason));
        }
        assert_eq!(h.store.update_calls(), updates);
    }

    #[tokio::test]
    async fn test_drag_after_delete() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Report", 20)).await.unwrap();
        h.reconciler.delete_task(task.id).await.unwrap();

        let outcome = DragReassignmentHandler::new()
            .handle(&mut h.reconciler, drop_on(task.id, "work"))
            .await
            .unwrap();
        assert_eq!(outcome, DragOutcome::Ignored(IgnoreReason::TaskMissing));
    }

    #[tokio::test]
    async fn test_drag_without_session() {
        let mut h = started().await;
        let task = h.reconciler.add_task(TaskDraft::new("Report", 20)).await.unwrap();
        h.auth.sign_out();

        let outcome = DragReassignmentHandler::new()
            .handle(&mut h.reconciler, drop_on(task.id, "work"))
            .await
            .unwrap();
        assert_eq!(outcome, DragOutcome::Ignored(IgnoreReason::NoSession));
    }

    #[test]
    fn test_drag_event_deserializes_ui_payload() {
        let event: DragEvent = serde_json::from_value(serde_json::json!({
            "draggedId": "42",
            "source": {"categoryId": "general", "index": 0},
            "destination": null
        }))
        .unwrap();
        assert!(event.destination.is_none());
        assert_eq!(event.dragged_id, "42");
    }
}
