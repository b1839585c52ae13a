//! Delta notification payload.

use serde::Deserialize;

use crate::publication::domain::ChannelUri;

/// One term of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Term {
    /// Term type, such as `uri` or `literal`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Term value.
    pub value: String,
}

/// Subject, predicate and object of one change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Triple {
    /// Subject term.
    pub subject: Term,
    /// Predicate term.
    pub predicate: Term,
    /// Object term.
    pub object: Term,
}

/// Triples inserted and deleted by one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangeSet {
    /// Inserted triples.
    #[serde(default)]
    pub inserts: Vec<Triple>,
    /// Deleted triples.
    #[serde(default)]
    pub deletes: Vec<Triple>,
}

/// Returns `true` when any inserted triple points at `channel`.
///
/// New tasks for a channel always insert a triple with the channel as its
/// object, so deltas without one cannot make a task eligible.
#[must_use]
pub fn mentions_channel(changes: &[ChangeSet], channel: &ChannelUri) -> bool {
    changes
        .iter()
        .flat_map(|change| &change.inserts)
        .any(|triple| triple.object.value == channel.as_str())
}
