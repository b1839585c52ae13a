//! Recipient resolution for a task's distribution event.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::publication::{
    domain::{EmailAddress, PublicationTask, resolve_recipients},
    ports::{LookupResult, RecipientDirectory},
};

/// Resolves the deduplicated recipients of a publication task.
#[derive(Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn RecipientDirectory>,
}

impl RecipientResolver {
    /// Creates a resolver backed by `directory`.
    #[must_use]
    pub fn new(directory: Arc<dyn RecipientDirectory>) -> Self {
        Self { directory }
    }

    /// Returns every address bound to the task's event, each exactly once.
    ///
    /// Malformed addresses are skipped with a warning rather than failing
    /// the task.
    ///
    /// # Errors
    ///
    /// Returns the directory's [`LookupError`](crate::publication::ports::LookupError)
    /// when the lookup fails.
    pub async fn resolve(&self, task: &PublicationTask) -> LookupResult<Vec<EmailAddress>> {
        let sources = self
            .directory
            .find_recipient_sources(task.graph(), task.event())
            .await?;
        let resolved = resolve_recipients(&sources);
        for rejected in &resolved.rejected {
            warn!(task = %task.id(), address = %rejected, "skipping malformed recipient address");
        }
        debug!(
            task = %task.id(),
            sources = sources.len(),
            recipients = resolved.addresses.len(),
            "resolved recipients"
        );
        Ok(resolved.addresses)
    }
}
