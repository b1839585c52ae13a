//! In-memory integration tests for the publication task repository.

use super::helpers::{channel, graph, repo, seed_task};
use chrono::Utc;
use mockable::DefaultClock;
use publication_mailer::publication::{
    adapters::memory::InMemoryTaskRepository,
    domain::{ChannelUri, EventUri, GraphUri, PublicationTask, TaskStatus, TaskUri},
    ports::{
        DiscoveryQuery, PublicationTaskRepository, RenderedContentUpdate, StatusTransition,
        TaskRepositoryError,
    },
};
use rstest::rstest;

fn query(channel: ChannelUri) -> DiscoveryQuery {
    DiscoveryQuery {
        status: TaskStatus::NotStarted,
        channel,
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_skips_tasks_without_a_known_event(
    repo: InMemoryTaskRepository,
    channel: ChannelUri,
) -> Result<(), eyre::Report> {
    let seeded = seed_task(&repo, "known", &channel)?;
    let orphan = PublicationTask::new(
        TaskUri::new("http://example.org/tasks/orphan")?,
        seeded.graph().clone(),
        channel.clone(),
        seeded.document().clone(),
        EventUri::new("http://example.org/events/none")?,
        &DefaultClock,
    );
    repo.insert_task(orphan)?;

    let found = repo.discover(&query(channel)).await?;

    eyre::ensure!(found == vec![seeded], "only the task with an event is eligible");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn conditional_write_applies_once(
    repo: InMemoryTaskRepository,
    channel: ChannelUri,
) -> Result<(), eyre::Report> {
    let task = seed_task(&repo, "claim", &channel)?;
    let mut claimed = task.clone();
    claimed.transition_to(TaskStatus::Ongoing, &DefaultClock)?;
    let transition = StatusTransition::between(&task, &claimed);

    repo.transition_status(&transition).await?;
    let second = repo.transition_status(&transition).await;

    eyre::ensure!(
        matches!(
            second,
            Err(TaskRepositoryError::Conflict {
                expected: TaskStatus::NotStarted,
                actual: TaskStatus::Ongoing,
                ..
            })
        ),
        "second claim should conflict, got {second:?}"
    );
    let stored = repo
        .find_by_id(task.graph(), task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task missing"))?;
    eyre::ensure!(stored.status() == TaskStatus::Ongoing);
    eyre::ensure!(stored.modified_at() == claimed.modified_at());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_modification_time_conflicts(
    repo: InMemoryTaskRepository,
    channel: ChannelUri,
) -> Result<(), eyre::Report> {
    let task = seed_task(&repo, "stale", &channel)?;
    let mut transition = StatusTransition {
        task: task.id().clone(),
        graph: task.graph().clone(),
        from: TaskStatus::NotStarted,
        expected_modified_at: task.modified_at() - chrono::Duration::seconds(1),
        to: TaskStatus::Ongoing,
        modified_at: Utc::now(),
    };

    let result = repo.transition_status(&transition).await;
    eyre::ensure!(result.as_ref().is_err_and(TaskRepositoryError::is_conflict));

    transition.expected_modified_at = task.modified_at();
    repo.transition_status(&transition).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn writes_to_unknown_tasks_are_not_found(
    repo: InMemoryTaskRepository,
    graph: GraphUri,
) -> Result<(), eyre::Report> {
    let missing = TaskUri::new("http://example.org/tasks/missing")?;

    let result = repo
        .replace_rendered_content(&RenderedContentUpdate {
            task: missing.clone(),
            graph,
            content: "<p>x</p>".to_owned(),
            modified_at: Utc::now(),
        })
        .await;

    eyre::ensure!(matches!(result, Err(TaskRepositoryError::NotFound(ref id)) if *id == missing));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookups_are_scoped_to_the_graph(
    repo: InMemoryTaskRepository,
    channel: ChannelUri,
) -> Result<(), eyre::Report> {
    let task = seed_task(&repo, "scoped", &channel)?;
    let other_graph = GraphUri::new("http://example.org/graphs/other")?;

    let found = repo.find_by_id(&other_graph, task.id()).await?;

    eyre::ensure!(found.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rendered_content_is_replaced(
    repo: InMemoryTaskRepository,
    channel: ChannelUri,
) -> Result<(), eyre::Report> {
    let task = seed_task(&repo, "content", &channel)?;
    for content in ["<p>first</p>", "<p>second</p>"] {
        repo.replace_rendered_content(&RenderedContentUpdate {
            task: task.id().clone(),
            graph: task.graph().clone(),
            content: content.to_owned(),
            modified_at: Utc::now(),
        })
        .await?;
    }

    let stored = repo
        .find_by_id(task.graph(), task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task missing"))?;
    eyre::ensure!(stored.rendered_content() == Some("<p>second</p>"));
    eyre::ensure!(stored.status() == TaskStatus::NotStarted);
    Ok(())
}
