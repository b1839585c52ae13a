//! Identifier types for the publication domain.
//!
//! Every resource in the shared store is addressed by an opaque URI. Each
//! kind of resource gets its own newtype so a document URI cannot be passed
//! where an event URI is expected.

use super::PublicationDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! resource_uri {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`PublicationDomainError::InvalidUri`] when the value
            /// is blank or contains whitespace.
            pub fn new(value: impl Into<String>) -> Result<Self, PublicationDomainError> {
                validate_uri(value.into(), $kind).map(Self)
            }

            /// Returns the identifier as `str`.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = PublicationDomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

resource_uri!(
    /// URI of a publication task.
    TaskUri,
    "task"
);
resource_uri!(
    /// Partition (named graph) a task and its related records live in.
    GraphUri,
    "graph"
);
resource_uri!(
    /// Distribution channel a task is routed to.
    ChannelUri,
    "channel"
);
resource_uri!(
    /// URI of the document (press release) being published.
    DocumentUri,
    "document"
);
resource_uri!(
    /// URI of the distribution event scheduling a document.
    EventUri,
    "event"
);
resource_uri!(
    /// URI of the organization that authored a document.
    OrganizationUri,
    "organization"
);
resource_uri!(
    /// URI of a file attached to a document.
    AttachmentUri,
    "attachment"
);
resource_uri!(
    /// URI of a contact list bound to a distribution event.
    ContactListUri,
    "contact list"
);
resource_uri!(
    /// URI of an individual contact bound to a distribution event.
    ContactUri,
    "contact"
);
resource_uri!(
    /// Mail folder an outbox message is filed under.
    FolderUri,
    "folder"
);

fn validate_uri(raw: String, kind: &'static str) -> Result<String, PublicationDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(PublicationDomainError::InvalidUri { kind, value: raw });
    }
    if trimmed.len() == raw.len() {
        Ok(raw)
    } else {
        Ok(trimmed.to_owned())
    }
}

/// Unique identifier of an outbox message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
