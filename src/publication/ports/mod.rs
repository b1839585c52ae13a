//! Port contracts for publication processing.
//!
//! Ports define infrastructure-agnostic interfaces used by publication
//! services.

pub mod document;
pub mod outbox;
pub mod recipient;
pub mod renderer;
pub mod repository;

pub use document::{DocumentRepository, LookupError, LookupResult};
pub use outbox::{Outbox, OutboxError, OutboxResult};
pub use recipient::RecipientDirectory;
pub use renderer::{DocumentRenderer, RenderError, RenderRequest, RenderedDocument};
pub use repository::{
    DiscoveryQuery, PublicationTaskRepository, RenderedContentUpdate, StatusTransition,
    TaskRepositoryError, TaskRepositoryResult,
};
