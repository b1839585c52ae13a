//! Outbox port receiving composed messages.

use crate::publication::domain::{MessageId, OutboxMessage};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for outbox writes.
pub type OutboxResult<T> = Result<T, OutboxError>;

/// Durable queue of outbound messages.
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Persists one message. Each call is an independent durable write.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Duplicate`] when the message ID was already
    /// written and [`OutboxError::Persistence`] on storage failure.
    async fn deliver(&self, message: &OutboxMessage) -> OutboxResult<()>;
}

/// Errors returned by outbox implementations.
#[derive(Debug, Clone, Error)]
pub enum OutboxError {
    /// A message with this ID is already in the outbox.
    #[error("duplicate outbox message: {0}")]
    Duplicate(MessageId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl OutboxError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
