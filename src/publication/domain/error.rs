//! Error types for publication domain validation and parsing.

use super::TaskStatus;
use thiserror::Error;

/// Errors returned while constructing or mutating domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublicationDomainError {
    /// A resource identifier is blank or malformed.
    #[error("invalid {kind} uri '{value}'")]
    InvalidUri {
        /// Kind of resource the identifier names.
        kind: &'static str,
        /// Rejected raw value.
        value: String,
    },

    /// An email address does not have a usable `local@domain` shape.
    #[error("invalid email address '{0}'")]
    InvalidEmailAddress(String),

    /// A document is missing its title.
    #[error("document title must not be empty")]
    EmptyTitle,

    /// A document is missing its body content.
    #[error("document body must not be empty")]
    EmptyBody,

    /// A contact has no name.
    #[error("contact full name must not be empty")]
    EmptyContactName,

    /// A recipient batch was built without any address.
    #[error("recipient batch must contain at least one address")]
    EmptyBatch,

    /// The requested status change is not permitted by the task lifecycle.
    #[error("invalid task status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Status the task currently has.
        from: TaskStatus,
        /// Status that was requested.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
