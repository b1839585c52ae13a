//! Lookup of addresses bound to a distribution event.

use super::LookupResult;
use crate::publication::domain::{EventUri, GraphUri, RecipientSource};
use async_trait::async_trait;

/// Recipient lookup contract.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Returns every address bound to `event`, through contact-list
    /// membership and through direct contact links alike.
    ///
    /// Implementations must return both shapes (a union); duplicates are
    /// allowed and removed by the caller.
    async fn find_recipient_sources(
        &self,
        graph: &GraphUri,
        event: &EventUri,
    ) -> LookupResult<Vec<RecipientSource>>;
}
