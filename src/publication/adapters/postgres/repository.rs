//! `PostgreSQL` implementations of the task, document and recipient ports.

use super::{
    models::{
        DocumentRow, RecipientRow, TaskRow, attachments_to_uris, row_to_document,
        row_to_recipient, row_to_task, sources_to_contacts,
    },
    pool::{PublicationPgPool, run_blocking},
    schema::{publication_documents, publication_tasks},
};
use crate::publication::{
    domain::{
        AttachmentUri, Contact, Document, DocumentUri, EventUri, GraphUri, PublicationTask,
        RecipientSource, TaskStatus, TaskUri,
    },
    ports::{
        DiscoveryQuery, DocumentRepository, LookupError, LookupResult, PublicationTaskRepository,
        RecipientDirectory, RenderedContentUpdate, StatusTransition, TaskRepositoryError,
        TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;

/// `PostgreSQL`-backed publication task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PublicationPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PublicationPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PublicationTaskRepository for PostgresTaskRepository {
    async fn discover(&self, query: &DiscoveryQuery) -> TaskRepositoryResult<Vec<PublicationTask>> {
        let status = query.status.as_str().to_owned();
        let channel = query.channel.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT t.id, t.graph, t.status, t.channel, t.document, t.event, ",
                "t.rendered_content, t.created_at, t.modified_at ",
                "FROM publication_tasks t ",
                "JOIN publication_events e ON e.id = t.event AND e.graph = t.graph ",
                "WHERE t.status = $1 AND t.channel = $2 AND e.ended_at IS NULL ",
                "ORDER BY t.created_at, t.id",
            ))
            .bind::<Text, _>(status)
            .bind::<Text, _>(channel)
            .load::<TaskRow>(connection)
            .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter()
                .map(|row| row_to_task(row).map_err(TaskRepositoryError::persistence))
                .collect()
        })
        .await
    }

    async fn transition_status(&self, transition: &StatusTransition) -> TaskRepositoryResult<()> {
        let transition = transition.clone();
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(
                publication_tasks::table
                    .filter(publication_tasks::id.eq(transition.task.as_str()))
                    .filter(publication_tasks::graph.eq(transition.graph.as_str()))
                    .filter(publication_tasks::status.eq(transition.from.as_str()))
                    .filter(publication_tasks::modified_at.eq(transition.expected_modified_at)),
            )
            .set((
                publication_tasks::status.eq(transition.to.as_str()),
                publication_tasks::modified_at.eq(transition.modified_at),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            if updated == 1 {
                return Ok(());
            }

            let actual = stored_status(connection, &transition.graph, &transition.task)?;
            Err(actual.map_or_else(
                || TaskRepositoryError::NotFound(transition.task.clone()),
                |status| TaskRepositoryError::Conflict {
                    task: transition.task.clone(),
                    expected: transition.from,
                    actual: status,
                },
            ))
        })
        .await
    }

    async fn replace_rendered_content(
        &self,
        update: &RenderedContentUpdate,
    ) -> TaskRepositoryResult<()> {
        let update = update.clone();
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(
                publication_tasks::table
                    .filter(publication_tasks::id.eq(update.task.as_str()))
                    .filter(publication_tasks::graph.eq(update.graph.as_str())),
            )
            .set((
                publication_tasks::rendered_content.eq(Some(update.content.as_str())),
                publication_tasks::modified_at.eq(update.modified_at),
            ))
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(update.task.clone()));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(
        &self,
        graph: &GraphUri,
        task: &TaskUri,
    ) -> TaskRepositoryResult<Option<PublicationTask>> {
        let graph_key = graph.as_str().to_owned();
        let task_key = task.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let row = publication_tasks::table
                .filter(publication_tasks::id.eq(&task_key))
                .filter(publication_tasks::graph.eq(&graph_key))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(|found| row_to_task(found).map_err(TaskRepositoryError::persistence))
                .transpose()
        })
        .await
    }
}

fn stored_status(
    connection: &mut PgConnection,
    graph: &GraphUri,
    task: &TaskUri,
) -> TaskRepositoryResult<Option<TaskStatus>> {
    let status = publication_tasks::table
        .filter(publication_tasks::id.eq(task.as_str()))
        .filter(publication_tasks::graph.eq(graph.as_str()))
        .select(publication_tasks::status)
        .first::<String>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)?;
    status
        .map(|raw| TaskStatus::try_from(raw.as_str()).map_err(TaskRepositoryError::persistence))
        .transpose()
}

/// `PostgreSQL`-backed document lookups.
#[derive(Debug, Clone)]
pub struct PostgresDocumentRepository {
    pool: PublicationPgPool,
}

impl PostgresDocumentRepository {
    /// Creates a new repository from a connection pool.
    #[must_use]
    pub const fn new(pool: PublicationPgPool) -> Self {
        Self { pool }
    }

    async fn load_row(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Option<DocumentRow>> {
        let graph_key = graph.as_str().to_owned();
        let document_key = document.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            publication_documents::table
                .filter(publication_documents::id.eq(&document_key))
                .filter(publication_documents::graph.eq(&graph_key))
                .select(DocumentRow::as_select())
                .first::<DocumentRow>(connection)
                .optional()
                .map_err(LookupError::persistence)
        })
        .await
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn find_document(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Option<Document>> {
        self.load_row(graph, document)
            .await?
            .map(row_to_document)
            .transpose()
    }

    async fn find_sources(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Vec<Contact>> {
        match self.load_row(graph, document).await? {
            Some(row) => sources_to_contacts(row.sources),
            None => Ok(Vec::new()),
        }
    }

    async fn find_attachments(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Vec<AttachmentUri>> {
        match self.load_row(graph, document).await? {
            Some(row) => attachments_to_uris(row.attachments),
            None => Ok(Vec::new()),
        }
    }
}

/// `PostgreSQL`-backed recipient directory.
#[derive(Debug, Clone)]
pub struct PostgresRecipientDirectory {
    pool: PublicationPgPool,
}

impl PostgresRecipientDirectory {
    /// Creates a new directory from a connection pool.
    #[must_use]
    pub const fn new(pool: PublicationPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for PostgresRecipientDirectory {
    async fn find_recipient_sources(
        &self,
        graph: &GraphUri,
        event: &EventUri,
    ) -> LookupResult<Vec<RecipientSource>> {
        let graph_key = graph.as_str().to_owned();
        let event_key = event.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT 'list' AS kind, l.list AS source, m.address AS address ",
                "FROM event_contact_lists l ",
                "JOIN contact_list_members m ON m.list = l.list ",
                "WHERE l.graph = $1 AND l.event = $2 ",
                "UNION ",
                "SELECT 'contact' AS kind, c.contact AS source, c.address AS address ",
                "FROM event_contacts c ",
                "WHERE c.graph = $1 AND c.event = $2 ",
                "ORDER BY kind DESC, source, address",
            ))
            .bind::<Text, _>(graph_key)
            .bind::<Text, _>(event_key)
            .load::<RecipientRow>(connection)
            .map_err(LookupError::persistence)?;
            rows.into_iter().map(row_to_recipient).collect()
        })
        .await
    }
}
