//! Domain model for publication task processing.
//!
//! The domain covers the task status lifecycle, the documents and contacts a
//! task publishes, recipient deduplication and batching, and the outbound
//! message records. Storage, rendering and transport stay outside.

mod document;
mod error;
mod ids;
mod outbox;
mod recipient;
mod task;

pub use document::{Contact, ContactPoint, ContactPointKind, Creator, Document, SourceDetails};
pub use error::{ParseTaskStatusError, PublicationDomainError};
pub use ids::{
    AttachmentUri, ChannelUri, ContactListUri, ContactUri, DocumentUri, EventUri, FolderUri,
    GraphUri, MessageId, OrganizationUri, TaskUri,
};
pub use outbox::{ComposeMessage, MessageEnvelope, OutboxMessage};
pub use recipient::{
    EmailAddress, RecipientBatch, RecipientSource, ResolvedRecipients, batch, resolve_recipients,
};
pub use task::{DistributionEvent, PersistedTaskData, PublicationTask, TaskStatus, stamp};
