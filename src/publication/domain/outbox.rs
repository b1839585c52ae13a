//! Outbound message records handed to the mail-sending subsystem.

use super::{AttachmentUri, EmailAddress, FolderUri, MessageId, RecipientBatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope fields shared by every message of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    /// Sender address.
    pub sender: EmailAddress,
    /// Primary recipient; actual recipients travel as blind copies.
    pub to: EmailAddress,
    /// Folder the message is filed under.
    pub folder: FolderUri,
}

/// Parameter object for composing an outbox message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeMessage {
    /// Identifier for the new message.
    pub id: MessageId,
    /// Sender, primary recipient and folder.
    pub envelope: MessageEnvelope,
    /// Blind-copy recipients.
    pub bcc: RecipientBatch,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Timestamp recorded as the send date.
    pub sent_at: DateTime<Utc>,
    /// Attached files.
    pub attachments: Vec<AttachmentUri>,
}

/// Immutable outbound message for one recipient batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    id: MessageId,
    sender: EmailAddress,
    to: EmailAddress,
    bcc: RecipientBatch,
    subject: String,
    html_body: String,
    sent_at: DateTime<Utc>,
    attachments: Vec<AttachmentUri>,
    folder: FolderUri,
}

impl OutboxMessage {
    /// Composes a message from its parts.
    #[must_use]
    pub fn compose(parts: ComposeMessage) -> Self {
        let ComposeMessage {
            id,
            envelope,
            bcc,
            subject,
            html_body,
            sent_at,
            attachments,
        } = parts;
        Self {
            id,
            sender: envelope.sender,
            to: envelope.to,
            bcc,
            subject,
            html_body,
            sent_at,
            attachments,
            folder: envelope.folder,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the resource URI minted from `base` and the message ID.
    #[must_use]
    pub fn resource_uri(&self, base: &str) -> String {
        format!("{base}{}", self.id)
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender(&self) -> &EmailAddress {
        &self.sender
    }

    /// Returns the primary recipient.
    #[must_use]
    pub const fn to(&self) -> &EmailAddress {
        &self.to
    }

    /// Returns the blind-copy recipients.
    #[must_use]
    pub const fn bcc(&self) -> &RecipientBatch {
        &self.bcc
    }

    /// Returns the subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the HTML body.
    #[must_use]
    pub fn html_body(&self) -> &str {
        &self.html_body
    }

    /// Returns the send timestamp.
    #[must_use]
    pub const fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Returns attached files; empty when the document has none.
    #[must_use]
    pub fn attachments(&self) -> &[AttachmentUri] {
        &self.attachments
    }

    /// Returns the folder the message is filed under.
    #[must_use]
    pub const fn folder(&self) -> &FolderUri {
        &self.folder
    }
}
