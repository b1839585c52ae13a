//! In-memory task store for tests and local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::publication::{
    domain::{DistributionEvent, EventUri, GraphUri, PublicationTask, TaskUri},
    ports::{
        DiscoveryQuery, PublicationTaskRepository, RenderedContentUpdate, StatusTransition,
        TaskRepositoryError, TaskRepositoryResult,
    },
};

/// Thread-safe in-memory publication task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskUri, PublicationTask>,
    events: HashMap<EventUri, DistributionEvent>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is poisoned.
    pub fn insert_task(&self, task: PublicationTask) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.tasks.insert(task.id().clone(), task);
        Ok(())
    }

    /// Stores or replaces a distribution event.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is poisoned.
    pub fn insert_event(&self, event: DistributionEvent) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.events.insert(event.id().clone(), event);
        Ok(())
    }

    /// Returns every stored task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the lock is poisoned.
    pub fn snapshot(&self) -> TaskRepositoryResult<Vec<PublicationTask>> {
        let state = self.read()?;
        let mut tasks: Vec<_> = state.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        Ok(tasks)
    }

    fn read(&self) -> TaskRepositoryResult<std::sync::RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskRepositoryResult<std::sync::RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

fn stored_mut<'a>(
    state: &'a mut InMemoryTaskState,
    graph: &GraphUri,
    task: &TaskUri,
) -> TaskRepositoryResult<&'a mut PublicationTask> {
    state
        .tasks
        .get_mut(task)
        .filter(|stored| stored.graph() == graph)
        .ok_or_else(|| TaskRepositoryError::NotFound(task.clone()))
}

#[async_trait]
impl PublicationTaskRepository for InMemoryTaskRepository {
    async fn discover(&self, query: &DiscoveryQuery) -> TaskRepositoryResult<Vec<PublicationTask>> {
        let state = self.read()?;
        let mut tasks: Vec<_> = state
            .tasks
            .values()
            .filter(|task| task.status() == query.status && task.channel() == &query.channel)
            .filter(|task| {
                state
                    .events
                    .get(task.event())
                    .is_some_and(|event| !event.is_closed())
            })
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        Ok(tasks)
    }

    async fn transition_status(&self, transition: &StatusTransition) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = stored_mut(&mut state, &transition.graph, &transition.task)?;
        if stored.status() != transition.from
            || stored.modified_at() != transition.expected_modified_at
        {
            return Err(TaskRepositoryError::Conflict {
                task: transition.task.clone(),
                expected: transition.from,
                actual: stored.status(),
            });
        }

        let mut data = stored.clone().into_persisted();
        data.status = transition.to;
        data.modified_at = transition.modified_at;
        *stored = PublicationTask::from_persisted(data);
        Ok(())
    }

    async fn replace_rendered_content(
        &self,
        update: &RenderedContentUpdate,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = stored_mut(&mut state, &update.graph, &update.task)?;
        let mut data = stored.clone().into_persisted();
        data.rendered_content = Some(update.content.clone());
        data.modified_at = update.modified_at;
        *stored = PublicationTask::from_persisted(data);
        Ok(())
    }

    async fn find_by_id(
        &self,
        graph: &GraphUri,
        task: &TaskUri,
    ) -> TaskRepositoryResult<Option<PublicationTask>> {
        let state = self.read()?;
        Ok(state
            .tasks
            .get(task)
            .filter(|stored| stored.graph() == graph)
            .cloned())
    }
}
