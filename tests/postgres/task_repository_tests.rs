//! `PostgreSQL` integration tests for the publication task repository.

use std::time::Duration;

use super::helpers::{GRAPH, TestDatabase, event, test_runtime};
use chrono::Utc;
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use publication_mailer::{
    config::DEFAULT_CHANNEL,
    publication::{
        adapters::postgres::PostgresTaskRepository,
        domain::{
            ChannelUri, DistributionEvent, DocumentUri, GraphUri, PublicationTask, TaskStatus,
            TaskUri,
        },
        ports::{
            DiscoveryQuery, PublicationTaskRepository, RenderedContentUpdate, StatusTransition,
            TaskRepositoryError,
        },
    },
};
use rstest::rstest;

fn channel() -> ChannelUri {
    ChannelUri::new(DEFAULT_CHANNEL).expect("valid channel")
}

fn graph() -> GraphUri {
    GraphUri::new(GRAPH).expect("valid graph")
}

fn task(name: &str, channel: &ChannelUri, event: &DistributionEvent) -> PublicationTask {
    PublicationTask::new(
        TaskUri::new(format!("http://example.org/tasks/{name}")).expect("valid task"),
        graph(),
        channel.clone(),
        DocumentUri::new(format!("http://example.org/documents/{name}")).expect("valid document"),
        event.id().clone(),
        &DefaultClock,
    )
}

/// Seeds an open event and a not-started task on the mailing-list channel.
fn seed_open_task(db: &TestDatabase<'_>, name: &str) -> PublicationTask {
    let open = event(name, None);
    db.seed_event(&graph(), &open);
    let seeded = task(name, &channel(), &open);
    db.seed_task(&seeded);
    seeded
}

fn claim(task: &PublicationTask) -> (PublicationTask, StatusTransition) {
    let mut claimed = task.clone();
    claimed
        .transition_to(TaskStatus::Ongoing, &DefaultClock)
        .expect("not started tasks can be claimed");
    let transition = StatusTransition::between(task, &claimed);
    (claimed, transition)
}

#[rstest]
fn discovery_orders_by_creation_and_skips_ineligible_tasks(
    shared_test_cluster: &'static TestCluster,
) {
    let db = TestDatabase::create(shared_test_cluster, "discovery");
    let repo = PostgresTaskRepository::new(db.pool());
    let rt = test_runtime();

    let open = event("open", None);
    let closed = event("closed", Some(Utc::now()));
    db.seed_event(&graph(), &open);
    db.seed_event(&graph(), &closed);

    let first = task("first", &channel(), &open);
    std::thread::sleep(Duration::from_millis(2));
    let second = task("second", &channel(), &open);
    let on_closed_event = task("closed-event", &channel(), &closed);
    let other_channel = task(
        "other-channel",
        &ChannelUri::new("http://example.org/channels/website").expect("valid channel"),
        &open,
    );
    let (already_claimed, _) = claim(&task("claimed", &channel(), &open));
    for seeded in [&second, &on_closed_event, &other_channel, &already_claimed, &first] {
        db.seed_task(seeded);
    }

    let found = rt
        .block_on(repo.discover(&DiscoveryQuery {
            status: TaskStatus::NotStarted,
            channel: channel(),
        }))
        .expect("discovery should succeed");

    assert_eq!(found, vec![first, second]);
}

#[rstest]
fn tasks_on_events_in_another_graph_are_not_discovered(
    shared_test_cluster: &'static TestCluster,
) {
    let db = TestDatabase::create(shared_test_cluster, "event_graph");
    let repo = PostgresTaskRepository::new(db.pool());
    let rt = test_runtime();
    let foreign = event("foreign", None);
    db.seed_event(
        &GraphUri::new("http://example.org/graphs/other").expect("valid graph"),
        &foreign,
    );
    db.seed_task(&task("foreign", &channel(), &foreign));

    let found = rt
        .block_on(repo.discover(&DiscoveryQuery {
            status: TaskStatus::NotStarted,
            channel: channel(),
        }))
        .expect("discovery should succeed");

    assert!(found.is_empty(), "got {found:?}");
}

#[rstest]
fn second_claim_with_the_same_snapshot_conflicts(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "double_claim");
    let repo = PostgresTaskRepository::new(db.pool());
    let rt = test_runtime();
    let seeded = seed_open_task(&db, "contested");
    let (claimed, transition) = claim(&seeded);

    rt.block_on(repo.transition_status(&transition))
        .expect("first claim should succeed");
    let second = rt.block_on(repo.transition_status(&transition));

    assert!(
        matches!(
            second,
            Err(TaskRepositoryError::Conflict {
                expected: TaskStatus::NotStarted,
                actual: TaskStatus::Ongoing,
                ..
            })
        ),
        "got {second:?}"
    );
    let stored = rt
        .block_on(repo.find_by_id(seeded.graph(), seeded.id()))
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(stored.status(), TaskStatus::Ongoing);
    assert_eq!(stored.modified_at(), claimed.modified_at());
}

#[rstest]
fn stale_modification_time_conflicts(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "stale_claim");
    let repo = PostgresTaskRepository::new(db.pool());
    let rt = test_runtime();
    let seeded = seed_open_task(&db, "stale");
    let (_, mut transition) = claim(&seeded);
    transition.expected_modified_at = seeded.modified_at() - chrono::Duration::seconds(1);

    let stale = rt.block_on(repo.transition_status(&transition));
    assert!(
        stale.as_ref().is_err_and(TaskRepositoryError::is_conflict),
        "got {stale:?}"
    );

    transition.expected_modified_at = seeded.modified_at();
    rt.block_on(repo.transition_status(&transition))
        .expect("a fresh snapshot should win");
}

#[rstest]
fn writes_to_unknown_tasks_are_not_found(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "unknown_task");
    let repo = PostgresTaskRepository::new(db.pool());
    let rt = test_runtime();
    let missing = task("missing", &channel(), &event("missing", None));
    let (_, transition) = claim(&missing);

    let claimed = rt.block_on(repo.transition_status(&transition));
    let rendered = rt.block_on(repo.replace_rendered_content(&RenderedContentUpdate {
        task: missing.id().clone(),
        graph: graph(),
        content: "<p>x</p>".to_owned(),
        modified_at: Utc::now(),
    }));

    assert!(matches!(claimed, Err(TaskRepositoryError::NotFound(ref id)) if id == missing.id()));
    assert!(matches!(rendered, Err(TaskRepositoryError::NotFound(ref id)) if id == missing.id()));
}

#[rstest]
fn rendered_content_is_replaced(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "rendered");
    let repo = PostgresTaskRepository::new(db.pool());
    let rt = test_runtime();
    let seeded = seed_open_task(&db, "content");

    for content in ["<p>first</p>", "<p>second</p>"] {
        rt.block_on(repo.replace_rendered_content(&RenderedContentUpdate {
            task: seeded.id().clone(),
            graph: graph(),
            content: content.to_owned(),
            modified_at: Utc::now(),
        }))
        .expect("content update should succeed");
    }

    let stored = rt
        .block_on(repo.find_by_id(seeded.graph(), seeded.id()))
        .expect("lookup should succeed")
        .expect("task should exist");
    assert_eq!(stored.rendered_content(), Some("<p>second</p>"));
    assert_eq!(stored.status(), TaskStatus::NotStarted);
}

#[rstest]
fn lookups_are_scoped_to_the_graph(shared_test_cluster: &'static TestCluster) {
    let db = TestDatabase::create(shared_test_cluster, "graph_scope");
    let repo = PostgresTaskRepository::new(db.pool());
    let rt = test_runtime();
    let seeded = seed_open_task(&db, "scoped");
    let other = GraphUri::new("http://example.org/graphs/other").expect("valid graph");

    let found = rt
        .block_on(repo.find_by_id(&other, seeded.id()))
        .expect("lookup should succeed");

    assert!(found.is_none());
}
