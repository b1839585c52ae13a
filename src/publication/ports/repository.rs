//! Repository port for publication task discovery and status changes.

use crate::publication::domain::{ChannelUri, GraphUri, PublicationTask, TaskStatus, TaskUri};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Filter for the eligibility read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryQuery {
    /// Status the tasks must currently have.
    pub status: TaskStatus,
    /// Channel the tasks must be routed to.
    pub channel: ChannelUri,
}

/// Conditional status change for one task.
///
/// The change applies only when the stored task still carries `from` and
/// `expected_modified_at`; any other writer in between makes it a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// Task to update.
    pub task: TaskUri,
    /// Graph the task lives in.
    pub graph: GraphUri,
    /// Status the caller last observed.
    pub from: TaskStatus,
    /// Modification timestamp the caller last observed.
    pub expected_modified_at: DateTime<Utc>,
    /// Status to write.
    pub to: TaskStatus,
    /// Modification timestamp to write.
    pub modified_at: DateTime<Utc>,
}

impl StatusTransition {
    /// Builds the transition that turns `before` into `after`.
    #[must_use]
    pub fn between(before: &PublicationTask, after: &PublicationTask) -> Self {
        Self {
            task: after.id().clone(),
            graph: after.graph().clone(),
            from: before.status(),
            expected_modified_at: before.modified_at(),
            to: after.status(),
            modified_at: after.modified_at(),
        }
    }
}

/// Replace-if-exists write of a task's rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContentUpdate {
    /// Task to update.
    pub task: TaskUri,
    /// Graph the task lives in.
    pub graph: GraphUri,
    /// Rendered document.
    pub content: String,
    /// Modification timestamp to write.
    pub modified_at: DateTime<Utc>,
}

/// Publication task persistence contract.
#[async_trait]
pub trait PublicationTaskRepository: Send + Sync {
    /// Returns tasks matching `query` whose distribution event has no end
    /// time, oldest first by creation time.
    ///
    /// Returns an empty list when nothing matches.
    async fn discover(&self, query: &DiscoveryQuery) -> TaskRepositoryResult<Vec<PublicationTask>>;

    /// Applies a conditional status change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// and [`TaskRepositoryError::Conflict`] when its stored status or
    /// modification time differ from the expected ones.
    async fn transition_status(&self, transition: &StatusTransition) -> TaskRepositoryResult<()>;

    /// Stores the rendered document on the task, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn replace_rendered_content(
        &self,
        update: &RenderedContentUpdate,
    ) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier within its graph.
    async fn find_by_id(
        &self,
        graph: &GraphUri,
        task: &TaskUri,
    ) -> TaskRepositoryResult<Option<PublicationTask>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("publication task not found: {0}")]
    NotFound(TaskUri),

    /// The stored task changed since the caller observed it.
    #[error("publication task {task} is {actual}, expected {expected}")]
    Conflict {
        /// Task whose update was rejected.
        task: TaskUri,
        /// Status the caller expected.
        expected: TaskStatus,
        /// Status found in storage.
        actual: TaskStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` when another writer got to the task first.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
