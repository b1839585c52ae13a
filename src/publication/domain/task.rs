//! Publication task aggregate and its status lifecycle.

use super::{
    ChannelUri, DocumentUri, EventUri, GraphUri, ParseTaskStatusError, PublicationDomainError,
    TaskUri,
};
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

const STATUS_CONCEPT_BASE: &str =
    "http://themis.vlaanderen.be/id/concept/publication-task-status/";

/// Publication task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Scheduled by the authoring side, not yet picked up.
    NotStarted,
    /// Claimed by a pipeline run and being processed.
    Ongoing,
    /// Published to every recipient batch.
    Success,
    /// Processing stopped on an error.
    Failed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Ongoing => "ongoing",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Returns the concept URI used for this status in the shared store.
    #[must_use]
    pub fn concept_uri(self) -> String {
        let slug = match self {
            Self::NotStarted => "not-started",
            Self::Ongoing => "ongoing",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        format!("{STATUS_CONCEPT_BASE}{slug}")
    }

    /// Returns `true` for statuses no transition leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Returns whether the lifecycle permits moving from `self` to `target`.
    ///
    /// `NotStarted` only moves to `Ongoing`, and `Ongoing` only ends in
    /// `Success` or `Failed`. Resetting a task to `NotStarted` is left to
    /// operators outside this service.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::NotStarted, Self::Ongoing)
                | (Self::Ongoing, Self::Success | Self::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let name = trimmed
            .strip_prefix(STATUS_CONCEPT_BASE)
            .unwrap_or(trimmed)
            .to_ascii_lowercase()
            .replace('-', "_");
        match name.as_str() {
            "not_started" => Ok(Self::NotStarted),
            "ongoing" => Ok(Self::Ongoing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Returns the current clock time truncated to microseconds.
///
/// Task timestamps double as optimistic-concurrency tokens, so they must
/// survive a round trip through storage that keeps microsecond precision.
#[must_use]
pub fn stamp(clock: &(impl Clock + ?Sized)) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(6)
}

/// Publication task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationTask {
    id: TaskUri,
    graph: GraphUri,
    status: TaskStatus,
    channel: ChannelUri,
    document: DocumentUri,
    event: EventUri,
    rendered_content: Option<String>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted publication task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskUri,
    /// Graph the task is stored in.
    pub graph: GraphUri,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Channel the task is routed to.
    pub channel: ChannelUri,
    /// Document scheduled for publication.
    pub document: DocumentUri,
    /// Distribution event that generated the task.
    pub event: EventUri,
    /// Rendered document, once rendering has happened.
    pub rendered_content: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl PublicationTask {
    /// Creates a new, not yet started task.
    ///
    /// Tasks are normally authored upstream; this constructor exists for
    /// seeding stores and for tests.
    #[must_use]
    pub fn new(
        id: TaskUri,
        graph: GraphUri,
        channel: ChannelUri,
        document: DocumentUri,
        event: EventUri,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = stamp(clock);
        Self {
            id,
            graph,
            status: TaskStatus::NotStarted,
            channel,
            document,
            event,
            rendered_content: None,
            created_at: timestamp,
            modified_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            graph: data.graph,
            status: data.status,
            channel: data.channel,
            document: data.document,
            event: data.event,
            rendered_content: data.rendered_content,
            created_at: data.created_at,
            modified_at: data.modified_at,
        }
    }

    /// Decomposes the task into its persisted fields.
    #[must_use]
    pub fn into_persisted(self) -> PersistedTaskData {
        PersistedTaskData {
            id: self.id,
            graph: self.graph,
            status: self.status,
            channel: self.channel,
            document: self.document,
            event: self.event,
            rendered_content: self.rendered_content,
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskUri {
        &self.id
    }

    /// Returns the graph the task lives in.
    #[must_use]
    pub const fn graph(&self) -> &GraphUri {
        &self.graph
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the distribution channel.
    #[must_use]
    pub const fn channel(&self) -> &ChannelUri {
        &self.channel
    }

    /// Returns the document to publish.
    #[must_use]
    pub const fn document(&self) -> &DocumentUri {
        &self.document
    }

    /// Returns the distribution event.
    #[must_use]
    pub const fn event(&self) -> &EventUri {
        &self.event
    }

    /// Returns the rendered document, if rendering has happened.
    #[must_use]
    pub fn rendered_content(&self) -> Option<&str> {
        self.rendered_content.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Moves the task to `target` and stamps the modification time.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationDomainError::InvalidStatusTransition`] when the
    /// lifecycle does not allow the move.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &(impl Clock + ?Sized),
    ) -> Result<(), PublicationDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(PublicationDomainError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Stores the rendered document on the task, replacing any earlier one.
    pub fn record_rendered_content(
        &mut self,
        content: impl Into<String>,
        clock: &(impl Clock + ?Sized),
    ) {
        self.rendered_content = Some(content.into());
        self.touch(clock);
    }

    fn touch(&mut self, clock: &(impl Clock + ?Sized)) {
        self.modified_at = stamp(clock);
    }
}

/// Scheduling record that links a document to its publication time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEvent {
    id: EventUri,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl DistributionEvent {
    /// Creates an open distribution event.
    #[must_use]
    pub const fn new(id: EventUri, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at,
            ended_at: None,
        }
    }

    /// Records the end time, closing the event.
    #[must_use]
    pub fn with_end(mut self, ended_at: DateTime<Utc>) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> &EventUri {
        &self.id
    }

    /// Returns the scheduled start time.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the end time, if recorded.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Returns `true` once an end time has been recorded.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }
}
