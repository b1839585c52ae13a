//! Publication task state machine.
//!
//! The pipeline discovers eligible tasks, claims them, and drives each one
//! through rendering, recipient batching and outbox dispatch to a terminal
//! status. It is the only writer of task status and rendered content.

use std::fmt;
use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::PublicationConfig;
use crate::publication::{
    domain::{
        DocumentUri, MessageId, PublicationDomainError, PublicationTask, SourceDetails, TaskStatus,
        TaskUri, batch,
    },
    ports::{
        DiscoveryQuery, DocumentRenderer, DocumentRepository, LookupError, Outbox,
        PublicationTaskRepository, RecipientDirectory, RenderError, RenderRequest,
        RenderedContentUpdate, StatusTransition, TaskRepositoryError,
    },
};

use super::{DispatchError, DispatchRequest, Dispatcher, RecipientResolver};

/// Step of the pipeline an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingPhase {
    /// Reading eligible tasks.
    Discover,
    /// Moving a task to ongoing.
    Claim,
    /// Reading the document, its sources or attachments.
    Retrieve,
    /// Rendering the document.
    Render,
    /// Writing the rendered document onto the task.
    PersistContent,
    /// Looking up recipients.
    ResolveRecipients,
    /// Writing outbox messages.
    Dispatch,
    /// Recording the final status.
    Finalize,
}

impl ProcessingPhase {
    /// Returns a stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::Claim => "claim",
            Self::Retrieve => "retrieve",
            Self::Render => "render",
            Self::PersistContent => "persist_content",
            Self::ResolveRecipients => "resolve_recipients",
            Self::Dispatch => "dispatch",
            Self::Finalize => "finalize",
        }
    }
}

impl fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while discovering, claiming or processing tasks.
#[derive(Debug, Clone, Error)]
pub enum PublicationError {
    /// The eligibility read failed; nothing was claimed.
    #[error("task discovery failed: {0}")]
    Discovery(#[source] TaskRepositoryError),

    /// The task could not be moved to ongoing.
    #[error("task claim failed: {0}")]
    Claim(#[source] TaskRepositoryError),

    /// The task's document does not exist.
    #[error("document {0} not found")]
    MissingDocument(DocumentUri),

    /// A lookup needed by the task failed.
    #[error("{phase} lookup failed: {source}")]
    Lookup {
        /// Phase that issued the lookup.
        phase: ProcessingPhase,
        /// Underlying lookup failure.
        #[source]
        source: LookupError,
    },

    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Writing the rendered document failed.
    #[error("failed to store rendered content: {0}")]
    PersistContent(#[source] TaskRepositoryError),

    /// Writing outbox messages failed part-way.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Recording the success status failed.
    #[error("failed to record final status: {0}")]
    Finalize(#[source] TaskRepositoryError),

    /// The task is in a status the lifecycle cannot continue from.
    #[error(transparent)]
    Domain(#[from] PublicationDomainError),
}

impl PublicationError {
    /// Returns the phase the error belongs to.
    #[must_use]
    pub const fn phase(&self) -> ProcessingPhase {
        match self {
            Self::Discovery(_) => ProcessingPhase::Discover,
            Self::Claim(_) => ProcessingPhase::Claim,
            Self::MissingDocument(_) => ProcessingPhase::Retrieve,
            Self::Lookup { phase, .. } => *phase,
            Self::Render(_) => ProcessingPhase::Render,
            Self::PersistContent(_) => ProcessingPhase::PersistContent,
            Self::Dispatch(_) => ProcessingPhase::Dispatch,
            Self::Finalize(_) | Self::Domain(_) => ProcessingPhase::Finalize,
        }
    }
}

/// Result type for pipeline operations that can fail as a whole.
pub type PublicationResult<T> = Result<T, PublicationError>;

/// Claim attempt that did not succeed.
#[derive(Debug, Clone)]
pub struct ClaimFailure {
    /// Task that was not claimed.
    pub task: TaskUri,
    /// Why the claim failed.
    pub error: TaskRepositoryError,
}

/// Outcome of claiming discovered tasks.
#[derive(Debug, Clone, Default)]
pub struct ClaimReport {
    /// Number of tasks discovery returned.
    pub discovered: usize,
    /// Tasks now owned by this run, in ongoing status.
    pub claimed: Vec<PublicationTask>,
    /// Tasks another run claimed first.
    pub lost: Vec<TaskUri>,
    /// Tasks whose claim write failed.
    pub failed: Vec<ClaimFailure>,
}

impl ClaimReport {
    /// Returns `true` when this run owns at least one task.
    #[must_use]
    pub fn has_claims(&self) -> bool {
        !self.claimed.is_empty()
    }

    /// Returns `true` when nothing was claimed and only store errors were
    /// the reason.
    #[must_use]
    pub fn only_failures(&self) -> bool {
        self.claimed.is_empty() && self.lost.is_empty() && !self.failed.is_empty()
    }
}

/// Result of processing one claimed task.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The task was published and recorded as successful.
    Succeeded {
        /// Task identifier.
        task: TaskUri,
        /// Outbox messages written for the task.
        messages: Vec<MessageId>,
    },
    /// The task stopped on an error and was marked failed.
    Failed {
        /// Task identifier.
        task: TaskUri,
        /// Error that stopped processing.
        error: PublicationError,
        /// Whether the failed status was stored.
        status_recorded: bool,
    },
}

impl TaskOutcome {
    /// Returns the task the outcome is about.
    #[must_use]
    pub const fn task(&self) -> &TaskUri {
        match self {
            Self::Succeeded { task, .. } | Self::Failed { task, .. } => task,
        }
    }

    /// Returns `true` for a successful outcome.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Counters for one discover-claim-process run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks returned by discovery.
    pub discovered: usize,
    /// Tasks claimed by the run.
    pub claimed: usize,
    /// Tasks that reached success.
    pub succeeded: usize,
    /// Tasks that ended failed.
    pub failed: usize,
}

/// Collaborators the pipeline drives.
#[derive(Clone)]
pub struct PublicationPorts {
    /// Task store.
    pub tasks: Arc<dyn PublicationTaskRepository>,
    /// Document lookups.
    pub documents: Arc<dyn DocumentRepository>,
    /// Recipient lookups.
    pub recipients: Arc<dyn RecipientDirectory>,
    /// Document renderer.
    pub renderer: Arc<dyn DocumentRenderer>,
    /// Outbound message queue.
    pub outbox: Arc<dyn Outbox>,
}

/// Publication task state machine.
#[derive(Clone)]
pub struct PublicationPipeline<C>
where
    C: Clock + Send + Sync,
{
    tasks: Arc<dyn PublicationTaskRepository>,
    documents: Arc<dyn DocumentRepository>,
    renderer: Arc<dyn DocumentRenderer>,
    resolver: RecipientResolver,
    dispatcher: Dispatcher<C>,
    config: Arc<PublicationConfig>,
    clock: Arc<C>,
}

impl<C> PublicationPipeline<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a pipeline over the given ports and configuration.
    #[must_use]
    pub fn new(ports: PublicationPorts, config: PublicationConfig, clock: Arc<C>) -> Self {
        let PublicationPorts {
            tasks,
            documents,
            recipients,
            renderer,
            outbox,
        } = ports;
        let dispatcher = Dispatcher::new(outbox, config.envelope.clone(), Arc::clone(&clock));
        Self {
            tasks,
            documents,
            renderer,
            resolver: RecipientResolver::new(recipients),
            dispatcher,
            config: Arc::new(config),
            clock,
        }
    }

    /// Returns the configuration the pipeline runs with.
    #[must_use]
    pub fn config(&self) -> &PublicationConfig {
        &self.config
    }

    /// Returns not-started tasks for the configured channel whose event is
    /// still open, oldest first.
    ///
    /// Discovery has no side effects; calling it twice without claiming in
    /// between returns the same tasks.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationError::Discovery`] when the store read fails.
    pub async fn discover(&self) -> PublicationResult<Vec<PublicationTask>> {
        let query = DiscoveryQuery {
            status: TaskStatus::NotStarted,
            channel: self.config.channel.clone(),
        };
        self.tasks
            .discover(&query)
            .await
            .map_err(PublicationError::Discovery)
    }

    /// Claims each task by moving it to ongoing before any side effect.
    ///
    /// Every claim is a conditional write expecting the status and
    /// modification time discovery observed, so two overlapping runs cannot
    /// both own a task. Claims that lose the race or fail are reported and
    /// those tasks are left alone.
    pub async fn begin_processing(&self, tasks: Vec<PublicationTask>) -> ClaimReport {
        let mut report = ClaimReport {
            discovered: tasks.len(),
            ..ClaimReport::default()
        };

        for task in tasks {
            let mut claimed = task.clone();
            if let Err(err) = claimed.transition_to(TaskStatus::Ongoing, &*self.clock) {
                warn!(task = %task.id(), status = %task.status(), error = %err, "task is not claimable");
                report.failed.push(ClaimFailure {
                    task: task.id().clone(),
                    error: TaskRepositoryError::Conflict {
                        task: task.id().clone(),
                        expected: TaskStatus::NotStarted,
                        actual: task.status(),
                    },
                });
                continue;
            }

            match self
                .tasks
                .transition_status(&StatusTransition::between(&task, &claimed))
                .await
            {
                Ok(()) => report.claimed.push(claimed),
                Err(err) if err.is_conflict() => {
                    info!(task = %task.id(), "task already claimed by another run");
                    report.lost.push(task.id().clone());
                }
                Err(err) => {
                    error!(
                        task = %task.id(),
                        graph = %task.graph(),
                        phase = %ProcessingPhase::Claim,
                        error = %err,
                        "failed to claim publication task"
                    );
                    report.failed.push(ClaimFailure {
                        task: task.id().clone(),
                        error: err,
                    });
                }
            }
        }

        info!(
            discovered = report.discovered,
            claimed = report.claimed.len(),
            lost = report.lost.len(),
            failed = report.failed.len(),
            "claimed publication tasks"
        );
        report
    }

    /// Discovers eligible tasks and claims them.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationError::Discovery`] when discovery fails; no task
    /// has changed in that case.
    pub async fn discover_and_claim(&self) -> PublicationResult<ClaimReport> {
        let tasks = self.discover().await?;
        if tasks.is_empty() {
            info!(channel = %self.config.channel, "no publication tasks to process");
            return Ok(ClaimReport::default());
        }
        info!(count = tasks.len(), "found publication tasks to process");
        Ok(self.begin_processing(tasks).await)
    }

    /// Processes claimed tasks one after another.
    ///
    /// A failing task never stops the tasks after it.
    pub async fn process_all(&self, tasks: Vec<PublicationTask>) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            outcomes.push(self.process(task).await);
        }
        outcomes
    }

    /// Discovers, claims and processes in one call.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationError::Discovery`] when discovery fails.
    pub async fn run_once(&self) -> PublicationResult<RunSummary> {
        let report = self.discover_and_claim().await?;
        let claimed = report.claimed.len();
        let outcomes = self.process_all(report.claimed).await;
        let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();
        Ok(RunSummary {
            discovered: report.discovered,
            claimed,
            succeeded,
            failed: outcomes.len() - succeeded,
        })
    }

    /// Publishes one claimed task and records its terminal status.
    ///
    /// Errors never escape: the task is marked failed, the error is logged
    /// with the task identity and phase, and returned in the outcome.
    pub async fn process(&self, task: PublicationTask) -> TaskOutcome {
        info!(task = %task.id(), graph = %task.graph(), "processing publication task");
        let mut current = task;
        match self.publish(&mut current).await {
            Ok(messages) => match self.finish(&mut current, TaskStatus::Success).await {
                Ok(()) => {
                    info!(task = %current.id(), messages = messages.len(), "publication task done");
                    TaskOutcome::Succeeded {
                        task: current.id().clone(),
                        messages,
                    }
                }
                Err(err) => self.fail(current, err).await,
            },
            Err(err) => self.fail(current, err).await,
        }
    }

    async fn publish(&self, task: &mut PublicationTask) -> PublicationResult<Vec<MessageId>> {
        let document = self
            .documents
            .find_document(task.graph(), task.document())
            .await
            .map_err(|source| PublicationError::Lookup {
                phase: ProcessingPhase::Retrieve,
                source,
            })?
            .ok_or_else(|| PublicationError::MissingDocument(task.document().clone()))?;
        let sources: Vec<SourceDetails> = self
            .documents
            .find_sources(task.graph(), task.document())
            .await
            .map_err(|source| PublicationError::Lookup {
                phase: ProcessingPhase::Retrieve,
                source,
            })?
            .iter()
            .map(|contact| contact.for_channel(&self.config.channel))
            .collect();

        let rendered = self.renderer.render(&RenderRequest {
            creator: document.creator().id.clone(),
            title: document.title().to_owned(),
            body: document.body().to_owned(),
            creator_name: document.creator().name.clone(),
            sources,
            date: self.clock.local().date_naive(),
        })?;

        let mut updated = task.clone();
        updated.record_rendered_content(rendered.into_inner(), &*self.clock);
        self.tasks
            .replace_rendered_content(&RenderedContentUpdate {
                task: updated.id().clone(),
                graph: updated.graph().clone(),
                content: updated.rendered_content().unwrap_or_default().to_owned(),
                modified_at: updated.modified_at(),
            })
            .await
            .map_err(PublicationError::PersistContent)?;
        *task = updated;

        let recipients =
            self.resolver
                .resolve(task)
                .await
                .map_err(|source| PublicationError::Lookup {
                    phase: ProcessingPhase::ResolveRecipients,
                    source,
                })?;
        let batches = batch(&recipients, self.config.batch_size);
        if batches.is_empty() {
            warn!(task = %task.id(), event = %task.event(), "no recipients bound to distribution event");
        }

        let attachments = self
            .documents
            .find_attachments(task.graph(), task.document())
            .await
            .map_err(|source| PublicationError::Lookup {
                phase: ProcessingPhase::Retrieve,
                source,
            })?;

        let report = self
            .dispatcher
            .dispatch(DispatchRequest {
                task: task.id(),
                subject: document.title(),
                body: task.rendered_content().unwrap_or_default(),
                batches: &batches,
                attachments: &attachments,
            })
            .await?;
        Ok(report.messages)
    }

    async fn finish(
        &self,
        task: &mut PublicationTask,
        status: TaskStatus,
    ) -> PublicationResult<()> {
        let mut updated = task.clone();
        updated.transition_to(status, &*self.clock)?;
        self.tasks
            .transition_status(&StatusTransition::between(task, &updated))
            .await
            .map_err(PublicationError::Finalize)?;
        *task = updated;
        Ok(())
    }

    async fn fail(&self, mut task: PublicationTask, err: PublicationError) -> TaskOutcome {
        let phase = err.phase();
        let delivered = match &err {
            PublicationError::Dispatch(dispatch) => dispatch.delivered.len(),
            _ => 0,
        };
        error!(
            task = %task.id(),
            graph = %task.graph(),
            phase = %phase,
            delivered,
            error = %err,
            "publication task failed"
        );

        let status_recorded = match self.finish(&mut task, TaskStatus::Failed).await {
            Ok(()) => true,
            Err(record_err) => {
                error!(
                    task = %task.id(),
                    graph = %task.graph(),
                    error = %record_err,
                    "failed to record failed status"
                );
                false
            }
        };

        TaskOutcome::Failed {
            task: task.id().clone(),
            error: err,
            status_recorded,
        }
    }
}
