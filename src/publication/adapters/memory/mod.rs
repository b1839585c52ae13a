//! In-memory adapters for tests and local runs.

mod document;
mod outbox;
mod recipient;
mod task;

pub use document::InMemoryDocumentRepository;
pub use outbox::InMemoryOutbox;
pub use recipient::InMemoryRecipientDirectory;
pub use task::InMemoryTaskRepository;
