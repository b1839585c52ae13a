//! `PostgreSQL` adapters for publication persistence.

pub mod models;
mod outbox;
mod pool;
mod repository;
mod schema;

pub use outbox::PostgresOutbox;
pub use pool::{BlockingCallError, PublicationPgPool, build_pool};
pub use repository::{
    PostgresDocumentRepository, PostgresRecipientDirectory, PostgresTaskRepository,
};
