//! Read-only lookups for documents and their related records.

use crate::publication::domain::{AttachmentUri, Contact, Document, DocumentUri, GraphUri};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Document lookup contract, keyed by document ID within a graph.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Finds the document with its title, body, creator and event.
    ///
    /// Returns `None` when the document does not exist. A stored document
    /// that lacks a required field is reported as [`LookupError::Malformed`].
    async fn find_document(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Option<Document>>;

    /// Returns the contacts cited as sources of the document.
    async fn find_sources(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Vec<Contact>>;

    /// Returns the files attached to the document.
    async fn find_attachments(
        &self,
        graph: &GraphUri,
        document: &DocumentUri,
    ) -> LookupResult<Vec<AttachmentUri>>;
}

/// Errors returned by lookup adapters.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// A stored record could not be mapped onto the domain.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl LookupError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
