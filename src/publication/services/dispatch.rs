//! Outbox dispatch of one message per recipient batch.

use std::sync::Arc;

use mockable::Clock;
use thiserror::Error;
use tracing::{debug, info};

use crate::publication::{
    domain::{
        AttachmentUri, ComposeMessage, MessageEnvelope, MessageId, OutboxMessage, RecipientBatch,
        TaskUri,
    },
    ports::{Outbox, OutboxError},
};

/// Content and recipients of one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    /// Task on whose behalf messages are sent; used for logging.
    pub task: &'a TaskUri,
    /// Subject line of every message.
    pub subject: &'a str,
    /// Rendered HTML body of every message.
    pub body: &'a str,
    /// Recipient batches, one message each.
    pub batches: &'a [RecipientBatch],
    /// Files attached to every message.
    pub attachments: &'a [AttachmentUri],
}

/// Messages written by a completed dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Identifiers of the written messages, in batch order.
    pub messages: Vec<MessageId>,
}

/// Dispatch stopped on an outbox failure.
///
/// Messages written before the failure stay in the outbox.
#[derive(Debug, Clone, Error)]
#[error("outbox write for batch {failed_batch} of {total_batches} failed: {source}")]
pub struct DispatchError {
    /// Messages already written before the failure.
    pub delivered: Vec<MessageId>,
    /// One-based index of the batch whose write failed.
    pub failed_batch: usize,
    /// Number of batches in the dispatch.
    pub total_batches: usize,
    /// Underlying outbox failure.
    #[source]
    pub source: OutboxError,
}

/// Writes outbox messages for recipient batches.
#[derive(Clone)]
pub struct Dispatcher<C>
where
    C: Clock + Send + Sync,
{
    outbox: Arc<dyn Outbox>,
    envelope: MessageEnvelope,
    clock: Arc<C>,
}

impl<C> Dispatcher<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher writing to `outbox` with a fixed envelope.
    #[must_use]
    pub fn new(outbox: Arc<dyn Outbox>, envelope: MessageEnvelope, clock: Arc<C>) -> Self {
        Self {
            outbox,
            envelope,
            clock,
        }
    }

    /// Writes one message per batch, in order.
    ///
    /// All messages of one dispatch share the same send timestamp. Writes are
    /// independent: when batch *k* fails, batches before it remain written
    /// and the remaining batches are not attempted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] carrying the already-written message IDs
    /// when an outbox write fails.
    pub async fn dispatch(
        &self,
        request: DispatchRequest<'_>,
    ) -> Result<DispatchReport, DispatchError> {
        let sent_at = self.clock.utc();
        let total_batches = request.batches.len();
        let mut report = DispatchReport::default();

        for (index, batch) in request.batches.iter().enumerate() {
            let message = OutboxMessage::compose(ComposeMessage {
                id: MessageId::new(),
                envelope: self.envelope.clone(),
                bcc: batch.clone(),
                subject: request.subject.to_owned(),
                html_body: request.body.to_owned(),
                sent_at,
                attachments: request.attachments.to_vec(),
            });

            if let Err(source) = self.outbox.deliver(&message).await {
                return Err(DispatchError {
                    delivered: report.messages,
                    failed_batch: index + 1,
                    total_batches,
                    source,
                });
            }
            debug!(
                task = %request.task,
                message = %message.id(),
                recipients = batch.len(),
                "queued outbox message"
            );
            report.messages.push(message.id());
        }

        info!(
            task = %request.task,
            messages = report.messages.len(),
            attachments = request.attachments.len(),
            "dispatched publication to outbox"
        );
        Ok(report)
    }
}
