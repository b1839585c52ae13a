//! Shared helpers for the `PostgreSQL` adapter integration tests.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::{BigInt, Jsonb, Nullable, Text, Timestamptz};
use pg_embedded_setup_unpriv::TestCluster;
use publication_mailer::publication::{
    adapters::postgres::PublicationPgPool,
    domain::{
        ContactListUri, ContactUri, DistributionEvent, EventUri, GraphUri, PublicationTask,
    },
};
use serde_json::Value;
use tokio::runtime::Runtime;

/// Schema applied to the template database.
const MIGRATION_SQL: &str =
    include_str!("../../migrations/2025-02-03-000000_create_publication_tables/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "publication_mailer_test_template";

/// Graph shared by helper-built records.
pub const GRAPH: &str = "http://example.org/graphs/kanselarij";

/// Creates a tokio runtime for driving the async adapters.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Executes a script statement by statement.
///
/// `diesel::sql_query` runs one statement per call, so the script is split
/// on semicolons. Comment-only fragments are skipped.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre::eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

fn ensure_template(cluster: &TestCluster) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            execute_sql_statements(&mut conn, MIGRATION_SQL)?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
    Ok(())
}

/// Drops the test database even when the test panics.
struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.db_name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.db_name);
        }
    }
}

/// Migrated database private to one test.
///
/// The pool is declared before the guard so its connections close before
/// the database is dropped.
pub struct TestDatabase<'a> {
    pool: PublicationPgPool,
    _guard: CleanupGuard<'a>,
}

impl<'a> TestDatabase<'a> {
    /// Clones the template into a fresh database named after `label`.
    pub fn create(cluster: &'a TestCluster, label: &str) -> Self {
        ensure_template(cluster).expect("template setup");
        let db_name = format!("test_{label}_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
            .expect("database from template");
        let guard = CleanupGuard {
            cluster,
            db_name: db_name.clone(),
        };
        let url = cluster.connection().database_url(&db_name);
        // A single connection keeps statement order deterministic.
        let pool = Pool::builder()
            .max_size(1)
            .build(ConnectionManager::<PgConnection>::new(url))
            .expect("connection pool");
        Self {
            pool,
            _guard: guard,
        }
    }

    /// Returns a handle to the pool for building adapters.
    pub fn pool(&self) -> PublicationPgPool {
        self.pool.clone()
    }

    fn execute(&self, query: impl FnOnce(&mut PgConnection) -> QueryResult<usize>) {
        let mut conn = self.pool.get().expect("pooled connection");
        query(&mut conn).expect("seed statement");
    }

    /// Stores a distribution event in `graph`.
    pub fn seed_event(&self, graph: &GraphUri, event: &DistributionEvent) {
        self.execute(|conn| {
            diesel::sql_query(
                "INSERT INTO publication_events (id, graph, started_at, ended_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind::<Text, _>(event.id().as_str())
            .bind::<Text, _>(graph.as_str())
            .bind::<Timestamptz, _>(event.started_at())
            .bind::<Nullable<Timestamptz>, _>(event.ended_at())
            .execute(conn)
        });
    }

    /// Stores a task exactly as built in memory.
    pub fn seed_task(&self, task: &PublicationTask) {
        self.execute(|conn| {
            diesel::sql_query(
                "INSERT INTO publication_tasks \
                 (id, graph, status, channel, document, event, rendered_content, \
                 created_at, modified_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind::<Text, _>(task.id().as_str())
            .bind::<Text, _>(task.graph().as_str())
            .bind::<Text, _>(task.status().as_str())
            .bind::<Text, _>(task.channel().as_str())
            .bind::<Text, _>(task.document().as_str())
            .bind::<Text, _>(task.event().as_str())
            .bind::<Nullable<Text>, _>(task.rendered_content())
            .bind::<Timestamptz, _>(task.created_at())
            .bind::<Timestamptz, _>(task.modified_at())
            .execute(conn)
        });
    }

    /// Stores a document row with JSON sources and attachments.
    pub fn seed_document(&self, document: &SeedDocument<'_>) {
        self.execute(|conn| {
            diesel::sql_query(
                "INSERT INTO publication_documents \
                 (id, graph, title, body, creator, creator_name, event, sources, attachments) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind::<Text, _>(document.id)
            .bind::<Text, _>(GRAPH)
            .bind::<Nullable<Text>, _>(document.title)
            .bind::<Nullable<Text>, _>(Some("<p>Inhoud</p>"))
            .bind::<Nullable<Text>, _>(Some("http://example.org/organizations/kanselarij"))
            .bind::<Nullable<Text>, _>(Some("Kanselarij"))
            .bind::<Text, _>(document.event)
            .bind::<Jsonb, _>(document.sources.clone())
            .bind::<Jsonb, _>(document.attachments.clone())
            .execute(conn)
        });
    }

    /// Adds `address` to the contact list `list`.
    pub fn add_list_member(&self, list: &ContactListUri, address: &str) {
        self.execute(|conn| {
            diesel::sql_query("INSERT INTO contact_list_members (list, address) VALUES ($1, $2)")
                .bind::<Text, _>(list.as_str())
                .bind::<Text, _>(address)
                .execute(conn)
        });
    }

    /// Binds a contact list to an event.
    pub fn bind_list(&self, graph: &GraphUri, event: &DistributionEvent, list: &ContactListUri) {
        self.execute(|conn| {
            diesel::sql_query(
                "INSERT INTO event_contact_lists (graph, event, list) VALUES ($1, $2, $3)",
            )
            .bind::<Text, _>(graph.as_str())
            .bind::<Text, _>(event.id().as_str())
            .bind::<Text, _>(list.as_str())
            .execute(conn)
        });
    }

    /// Binds a contact address to an event directly.
    pub fn bind_contact(
        &self,
        graph: &GraphUri,
        event: &DistributionEvent,
        contact: &ContactUri,
        address: &str,
    ) {
        self.execute(|conn| {
            diesel::sql_query(
                "INSERT INTO event_contacts (graph, event, contact, address) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind::<Text, _>(graph.as_str())
            .bind::<Text, _>(event.id().as_str())
            .bind::<Text, _>(contact.as_str())
            .bind::<Text, _>(address)
            .execute(conn)
        });
    }

    /// Returns the URIs of every stored outbox row.
    pub fn outbox_uris(&self) -> Vec<String> {
        let mut conn = self.pool.get().expect("pooled connection");
        diesel::sql_query("SELECT uri FROM outbox_messages ORDER BY sent_at, uri")
            .load::<StoredUri>(&mut conn)
            .expect("outbox query")
            .into_iter()
            .map(|row| row.uri)
            .collect()
    }

    /// Counts the rows of `table`.
    pub fn count(&self, table: &str) -> i64 {
        let mut conn = self.pool.get().expect("pooled connection");
        diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {table}"))
            .get_result::<RowCount>(&mut conn)
            .expect("count query")
            .count
    }
}

/// Document fields that vary between tests.
pub struct SeedDocument<'a> {
    /// Document URI.
    pub id: &'a str,
    /// Title; `None` stores a malformed document.
    pub title: Option<&'a str>,
    /// Event URI.
    pub event: &'a str,
    /// Source contacts in their stored JSON shape.
    pub sources: Value,
    /// Attachment URIs as a JSON array.
    pub attachments: Value,
}

#[derive(QueryableByName)]
struct StoredUri {
    #[diesel(sql_type = Text)]
    uri: String,
}

#[derive(QueryableByName)]
struct RowCount {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Builds an event that ended at `ended_at`, or an open one.
pub fn event(name: &str, ended_at: Option<DateTime<Utc>>) -> DistributionEvent {
    let open = DistributionEvent::new(
        EventUri::new(format!("http://example.org/events/{name}")).expect("valid event"),
        Utc::now(),
    );
    match ended_at {
        Some(end) => open.with_end(end),
        None => open,
    }
}
