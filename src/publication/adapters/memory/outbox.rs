//! In-memory outbox.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::publication::{
    domain::OutboxMessage,
    ports::{Outbox, OutboxError, OutboxResult},
};

/// Thread-safe outbox that keeps messages in write order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutbox {
    messages: Arc<RwLock<Vec<OutboxMessage>>>,
}

impl InMemoryOutbox {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every written message in write order.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Persistence`] when the lock is poisoned.
    pub fn messages(&self) -> OutboxResult<Vec<OutboxMessage>> {
        let messages = self
            .messages
            .read()
            .map_err(|err| OutboxError::persistence(std::io::Error::other(err.to_string())))?;
        Ok(messages.clone())
    }
}

#[async_trait]
impl Outbox for InMemoryOutbox {
    async fn deliver(&self, message: &OutboxMessage) -> OutboxResult<()> {
        let mut messages = self
            .messages
            .write()
            .map_err(|err| OutboxError::persistence(std::io::Error::other(err.to_string())))?;
        if messages.iter().any(|stored| stored.id() == message.id()) {
            return Err(OutboxError::Duplicate(message.id()));
        }
        messages.push(message.clone());
        Ok(())
    }
}
