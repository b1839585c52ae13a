//! Recipient addresses, their sources, and outbound batching.

use super::{ContactListUri, ContactUri, PublicationDomainError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses an address, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationDomainError::InvalidEmailAddress`] unless the
    /// value has exactly one `@` with non-empty parts on both sides and no
    /// inner whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, PublicationDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let mut parts = trimmed.split('@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        let is_valid = !local.is_empty()
            && !domain.is_empty()
            && parts.next().is_none()
            && !trimmed.chars().any(char::is_whitespace);
        if !is_valid {
            return Err(PublicationDomainError::InvalidEmailAddress(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the address as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which two spellings of one mailbox compare equal.
    fn dedup_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = PublicationDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relationship through which an address is bound to a distribution event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipientSource {
    /// The address belongs to a member of a contact list bound to the event.
    ListMembership {
        /// Contact list bound to the event.
        list: ContactListUri,
        /// Raw address as stored.
        address: String,
    },
    /// The address belongs to a contact bound to the event directly.
    DirectContact {
        /// Contact bound to the event.
        contact: ContactUri,
        /// Raw address as stored.
        address: String,
    },
}

impl RecipientSource {
    /// Returns the raw address carried by either variant.
    #[must_use]
    pub fn address(&self) -> &str {
        match self {
            Self::ListMembership { address, .. } | Self::DirectContact { address, .. } => address,
        }
    }
}

/// Outcome of merging recipient sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRecipients {
    /// Deduplicated addresses in first-seen order.
    pub addresses: Vec<EmailAddress>,
    /// Raw values that could not be parsed as addresses.
    pub rejected: Vec<String>,
}

/// Merges recipient sources of both shapes into one duplicate-free list.
///
/// Deduplication runs over the union, so an address reached through a
/// contact list and directly is kept once, at its first position. Addresses
/// compare case-insensitively; the first spelling seen is kept.
#[must_use]
pub fn resolve_recipients<'a>(
    sources: impl IntoIterator<Item = &'a RecipientSource>,
) -> ResolvedRecipients {
    let mut seen = HashSet::new();
    let mut resolved = ResolvedRecipients::default();
    for source in sources {
        match EmailAddress::new(source.address()) {
            Ok(address) => {
                if seen.insert(address.dedup_key()) {
                    resolved.addresses.push(address);
                }
            }
            Err(_) => resolved.rejected.push(source.address().to_owned()),
        }
    }
    resolved
}

/// Non-empty group of recipients sent in one outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<EmailAddress>", into = "Vec<EmailAddress>")]
pub struct RecipientBatch(Vec<EmailAddress>);

impl RecipientBatch {
    /// Creates a batch.
    ///
    /// # Errors
    ///
    /// Returns [`PublicationDomainError::EmptyBatch`] when `addresses` is
    /// empty.
    pub fn new(addresses: Vec<EmailAddress>) -> Result<Self, PublicationDomainError> {
        if addresses.is_empty() {
            return Err(PublicationDomainError::EmptyBatch);
        }
        Ok(Self(addresses))
    }

    /// Returns the addresses in order.
    #[must_use]
    pub fn addresses(&self) -> &[EmailAddress] {
        &self.0
    }

    /// Returns the number of addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; batches are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<EmailAddress>> for RecipientBatch {
    type Error = PublicationDomainError;

    fn try_from(value: Vec<EmailAddress>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecipientBatch> for Vec<EmailAddress> {
    fn from(value: RecipientBatch) -> Self {
        value.0
    }
}

impl<'a> IntoIterator for &'a RecipientBatch {
    type Item = &'a EmailAddress;
    type IntoIter = std::slice::Iter<'a, EmailAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Splits recipients into contiguous batches of at most `batch_size`.
///
/// Order is preserved and the batch count is `ceil(n / batch_size)`; an
/// empty input yields no batches at all.
#[must_use]
pub fn batch(recipients: &[EmailAddress], batch_size: NonZeroUsize) -> Vec<RecipientBatch> {
    recipients
        .chunks(batch_size.get())
        .map(|chunk| RecipientBatch(chunk.to_vec()))
        .collect()
}
