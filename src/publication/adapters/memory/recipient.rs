//! In-memory recipient directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::publication::{
    domain::{ContactListUri, ContactUri, EventUri, GraphUri, RecipientSource},
    ports::{LookupError, LookupResult, RecipientDirectory},
};

/// Thread-safe in-memory recipient directory.
///
/// Contact lists hold member addresses; events bind lists and individual
/// contacts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipientDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    lists: HashMap<ContactListUri, Vec<String>>,
    bound_lists: HashMap<(GraphUri, EventUri), Vec<ContactListUri>>,
    bound_contacts: HashMap<(GraphUri, EventUri), Vec<(ContactUri, String)>>,
}

impl InMemoryRecipientDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a contact list and its member addresses.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Persistence`] when the lock is poisoned.
    pub fn define_list(
        &self,
        list: ContactListUri,
        members: impl IntoIterator<Item = impl Into<String>>,
    ) -> LookupResult<()> {
        let mut state = self.write()?;
        state
            .lists
            .insert(list, members.into_iter().map(Into::into).collect());
        Ok(())
    }

    /// Binds a contact list to an event.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Persistence`] when the lock is poisoned.
    pub fn bind_list(
        &self,
        graph: GraphUri,
        event: EventUri,
        list: ContactListUri,
    ) -> LookupResult<()> {
        let mut state = self.write()?;
        state
            .bound_lists
            .entry((graph, event))
            .or_default()
            .push(list);
        Ok(())
    }

    /// Binds an individual contact's address to an event.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Persistence`] when the lock is poisoned.
    pub fn bind_contact(
        &self,
        graph: GraphUri,
        event: EventUri,
        contact: ContactUri,
        address: impl Into<String>,
    ) -> LookupResult<()> {
        let mut state = self.write()?;
        state
            .bound_contacts
            .entry((graph, event))
            .or_default()
            .push((contact, address.into()));
        Ok(())
    }

    fn write(&self) -> LookupResult<std::sync::RwLockWriteGuard<'_, DirectoryState>> {
        self.state
            .write()
            .map_err(|err| LookupError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryRecipientDirectory {
    async fn find_recipient_sources(
        &self,
        graph: &GraphUri,
        event: &EventUri,
    ) -> LookupResult<Vec<RecipientSource>> {
        let state = self
            .state
            .read()
            .map_err(|err| LookupError::persistence(std::io::Error::other(err.to_string())))?;
        let key = (graph.clone(), event.clone());

        let via_lists = state
            .bound_lists
            .get(&key)
            .into_iter()
            .flatten()
            .flat_map(|list| {
                state
                    .lists
                    .get(list)
                    .into_iter()
                    .flatten()
                    .map(move |address| RecipientSource::ListMembership {
                        list: list.clone(),
                        address: address.clone(),
                    })
            });
        let direct = state
            .bound_contacts
            .get(&key)
            .into_iter()
            .flatten()
            .map(|(contact, address)| RecipientSource::DirectContact {
                contact: contact.clone(),
                address: address.clone(),
            });

        Ok(via_lists.chain(direct).collect())
    }
}
