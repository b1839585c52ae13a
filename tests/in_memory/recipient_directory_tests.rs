//! In-memory integration tests for the recipient directory.

use super::helpers::{graph, open_event};
use publication_mailer::publication::{
    adapters::memory::InMemoryRecipientDirectory,
    domain::{ContactListUri, ContactUri, GraphUri, RecipientSource},
    ports::RecipientDirectory,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn both_binding_shapes_are_returned(graph: GraphUri) -> Result<(), eyre::Report> {
    let directory = InMemoryRecipientDirectory::new();
    let event = open_event("bindings");
    let list = ContactListUri::new("http://example.org/lists/press")?;
    directory.define_list(list.clone(), ["a@example.org", "b@example.org"])?;
    directory.bind_list(graph.clone(), event.id().clone(), list)?;
    directory.bind_contact(
        graph.clone(),
        event.id().clone(),
        ContactUri::new("http://example.org/contacts/c")?,
        "c@example.org",
    )?;

    let sources = directory
        .find_recipient_sources(&graph, event.id())
        .await?;

    let list_members = sources
        .iter()
        .filter(|source| matches!(source, RecipientSource::ListMembership { .. }))
        .count();
    let direct = sources
        .iter()
        .filter(|source| matches!(source, RecipientSource::DirectContact { .. }))
        .count();
    eyre::ensure!(list_members == 2 && direct == 1, "got {sources:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unbound_events_have_no_recipients(graph: GraphUri) -> Result<(), eyre::Report> {
    let directory = InMemoryRecipientDirectory::new();
    let event = open_event("unbound");

    let sources = directory
        .find_recipient_sources(&graph, event.id())
        .await?;

    eyre::ensure!(sources.is_empty());
    Ok(())
}
