//! In-memory document store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::publication::{
    domain::{AttachmentUri, Contact, Document, DocumentUri, GraphUri},
    ports::{DocumentRepository, LookupError, LookupResult},
};

/// Thread-safe in-memory document repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    state: Arc<RwLock<HashMap<DocumentUri, StoredDocument>>>,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    graph: GraphUri,
    document: Document,
    sources: Vec<Contact>,
    attachments: Vec<AttachmentUri>,
}

impl InMemoryDocumentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document with its sources and attachments in `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Persistence`] when the lock is poisoned.
    pub fn insert(
        &self,
        graph: GraphUri,
        document: Document,
        sources: Vec<Contact>,
        attachments: Vec<AttachmentUri>,
    ) -> LookupResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| LookupError::persistence(std::io::Error::other(err.to_string())))?;
        state.insert(
            document.id().clone(),
            StoredDocument {
                graph,
                document,
                sources,
                attachments,
            },
        );
        Ok(())
    }

    fn lookup<T>(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
        project: impl FnOnce(&StoredDocument) -> T,
    ) -> LookupResult<Option<T>> {
        let state = self
            .state
            .read()
            .map_err(|err| LookupError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(state
            .get(document)
            .filter(|stored| &stored.graph == graph)
            .map(project))
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn find_document(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Option<Document>> {
        self.lookup(graph, document, |stored| stored.document.clone())
    }

    async fn find_sources(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Vec<Contact>> {
        self.lookup(graph, document, |stored| stored.sources.clone())
            .map(Option::unwrap_or_default)
    }

    async fn find_attachments(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Vec<AttachmentUri>> {
        self.lookup(graph, document, |stored| stored.attachments.clone())
            .map(Option::unwrap_or_default)
    }
}
