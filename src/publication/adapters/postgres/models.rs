//! Diesel row models and their mapping onto the domain.

use super::schema::{outbox_messages, publication_documents, publication_tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::publication::{
    domain::{
        AttachmentUri, ChannelUri, Contact, ContactListUri, ContactPoint, ContactPointKind,
        ContactUri, Creator, Document, DocumentUri, EventUri, GraphUri, OrganizationUri,
        OutboxMessage, PersistedTaskData, PublicationTask, RecipientSource, TaskStatus, TaskUri,
    },
    ports::LookupError,
};

/// Query result row for publication tasks.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = publication_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task URI.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub id: String,
    /// Graph URI.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub graph: String,
    /// Lifecycle status.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub status: String,
    /// Channel URI.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub channel: String,
    /// Document URI.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub document: String,
    /// Event URI.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub event: String,
    /// Rendered document.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub rendered_content: Option<String>,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub modified_at: DateTime<Utc>,
}

/// Query result row for documents.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = publication_documents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentRow {
    /// Document URI.
    pub id: String,
    /// Graph URI.
    pub graph: String,
    /// Title.
    pub title: Option<String>,
    /// HTML body.
    pub body: Option<String>,
    /// Creator organization URI.
    pub creator: Option<String>,
    /// Creator display name.
    pub creator_name: Option<String>,
    /// Event URI.
    pub event: String,
    /// Source contacts as JSON.
    pub sources: Value,
    /// Attachment URIs as JSON.
    pub attachments: Value,
}

/// Stored shape of one source contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Full name.
    pub full_name: String,
    /// Role.
    #[serde(default)]
    pub role: Option<String>,
    /// Organization name.
    #[serde(default)]
    pub organization: Option<String>,
    /// Contact points.
    #[serde(default)]
    pub contact_points: Vec<ContactPointRecord>,
}

/// Stored shape of one contact point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPointRecord {
    /// Kind of contact point.
    pub kind: ContactPointKind,
    /// Number or address.
    pub value: String,
    /// Channel URI the point is valid for.
    pub channel: String,
}

/// Query result row for recipient lookups.
#[derive(Debug, Clone, QueryableByName)]
pub struct RecipientRow {
    /// `list` or `contact`.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub kind: String,
    /// Contact list or contact URI.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub source: String,
    /// Raw address.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub address: String,
}

/// Insert model for outbox messages.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = outbox_messages)]
pub struct NewOutboxRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Minted resource URI.
    pub uri: String,
    /// Sender address.
    pub sender: String,
    /// Primary recipient address.
    pub recipient: String,
    /// Blind-copy addresses.
    pub bcc: Value,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Send timestamp.
    pub sent_at: DateTime<Utc>,
    /// Attachment URIs.
    pub attachments: Value,
    /// Folder URI.
    pub folder: String,
}

/// Error raised when a stored value does not fit the domain.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RowMappingError(pub String);

fn malformed(err: impl std::fmt::Display) -> RowMappingError {
    RowMappingError(err.to_string())
}

/// Converts a task row into a domain task.
///
/// # Errors
///
/// Returns [`RowMappingError`] when a URI or the status is not valid.
pub fn row_to_task(row: TaskRow) -> Result<PublicationTask, RowMappingError> {
    let TaskRow {
        id,
        graph,
        status,
        channel,
        document,
        event,
        rendered_content,
        created_at,
        modified_at,
    } = row;
    Ok(PublicationTask::from_persisted(PersistedTaskData {
        id: TaskUri::new(id).map_err(malformed)?,
        graph: GraphUri::new(graph).map_err(malformed)?,
        status: TaskStatus::try_from(status.as_str()).map_err(malformed)?,
        channel: ChannelUri::new(channel).map_err(malformed)?,
        document: DocumentUri::new(document).map_err(malformed)?,
        event: EventUri::new(event).map_err(malformed)?,
        rendered_content,
        created_at,
        modified_at,
    }))
}

/// Converts a document row into a domain document.
///
/// # Errors
///
/// Returns [`LookupError::Malformed`] when the title, body or creator is
/// missing or invalid.
pub fn row_to_document(row: DocumentRow) -> Result<Document, LookupError> {
    let missing = |field: &str| LookupError::Malformed(format!("document {} has no {field}", row.id));
    let creator_raw = row.creator.clone().ok_or_else(|| missing("creator"))?;
    let title = row.title.clone().ok_or_else(|| missing("title"))?;
    let body = row.body.clone().ok_or_else(|| missing("body"))?;
    let lookup_err = |err: crate::publication::domain::PublicationDomainError| {
        LookupError::Malformed(format!("document {}: {err}", row.id))
    };

    let creator = Creator {
        id: OrganizationUri::new(creator_raw).map_err(lookup_err)?,
        name: row.creator_name.clone(),
    };
    Document::new(
        DocumentUri::new(row.id.clone()).map_err(lookup_err)?,
        title,
        body,
        creator,
        EventUri::new(row.event.clone()).map_err(lookup_err)?,
    )
    .map_err(lookup_err)
}

/// Converts stored sources into domain contacts.
///
/// # Errors
///
/// Returns [`LookupError::Malformed`] when the JSON or a contact is invalid.
pub fn sources_to_contacts(sources: Value) -> Result<Vec<Contact>, LookupError> {
    let records: Vec<SourceRecord> = serde_json::from_value(sources)
        .map_err(|err| LookupError::Malformed(format!("invalid sources: {err}")))?;
    records.into_iter().map(record_to_contact).collect()
}

fn record_to_contact(record: SourceRecord) -> Result<Contact, LookupError> {
    let to_lookup = |err: crate::publication::domain::PublicationDomainError| {
        LookupError::Malformed(format!("invalid source: {err}"))
    };
    let mut contact = Contact::new(record.full_name).map_err(to_lookup)?;
    if let Some(role) = record.role {
        contact = contact.with_role(role);
    }
    if let Some(organization) = record.organization {
        contact = contact.with_organization(organization);
    }
    for point in record.contact_points {
        contact = contact.with_contact_point(ContactPoint {
            kind: point.kind,
            value: point.value,
            channel: ChannelUri::new(point.channel).map_err(to_lookup)?,
        });
    }
    Ok(contact)
}

/// Converts stored attachments into domain URIs.
///
/// # Errors
///
/// Returns [`LookupError::Malformed`] when the JSON or a URI is invalid.
pub fn attachments_to_uris(attachments: Value) -> Result<Vec<AttachmentUri>, LookupError> {
    let raw: Vec<String> = serde_json::from_value(attachments)
        .map_err(|err| LookupError::Malformed(format!("invalid attachments: {err}")))?;
    raw.into_iter()
        .map(|value| {
            AttachmentUri::new(value)
                .map_err(|err| LookupError::Malformed(format!("invalid attachment: {err}")))
        })
        .collect()
}

/// Converts a recipient row into a recipient source.
///
/// # Errors
///
/// Returns [`LookupError::Malformed`] for an unknown kind or invalid URI.
pub fn row_to_recipient(row: RecipientRow) -> Result<RecipientSource, LookupError> {
    let to_lookup = |err: crate::publication::domain::PublicationDomainError| {
        LookupError::Malformed(format!("invalid recipient source: {err}"))
    };
    match row.kind.as_str() {
        "list" => Ok(RecipientSource::ListMembership {
            list: ContactListUri::new(row.source).map_err(to_lookup)?,
            address: row.address,
        }),
        "contact" => Ok(RecipientSource::DirectContact {
            contact: ContactUri::new(row.source).map_err(to_lookup)?,
            address: row.address,
        }),
        other => Err(LookupError::Malformed(format!(
            "unknown recipient source kind: {other}"
        ))),
    }
}

/// Builds the insert row for an outbox message.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when the recipient or attachment lists fail
/// to serialize.
pub fn message_to_row(
    message: &OutboxMessage,
    base_uri: &str,
) -> Result<NewOutboxRow, serde_json::Error> {
    Ok(NewOutboxRow {
        id: message.id().into_inner(),
        uri: message.resource_uri(base_uri),
        sender: message.sender().as_str().to_owned(),
        recipient: message.to().as_str().to_owned(),
        bcc: serde_json::to_value(message.bcc())?,
        subject: message.subject().to_owned(),
        html_body: message.html_body().to_owned(),
        sent_at: message.sent_at(),
        attachments: serde_json::to_value(message.attachments())?,
        folder: message.folder().as_str().to_owned(),
    })
}
