//! Then steps for publication pipeline BDD scenarios.

use super::world::{PublicationWorld, run_async};
use publication_mailer::publication::{domain::TaskStatus, ports::PublicationTaskRepository};
use rstest_bdd_macros::then;

#[then(r#"the trigger acknowledges with "{expected}""#)]
fn trigger_acknowledges(world: &PublicationWorld, expected: String) -> Result<(), eyre::Report> {
    let actual = world
        .acknowledgement
        .as_deref()
        .ok_or_else(|| eyre::eyre!("trigger has not fired"))?;
    eyre::ensure!(
        actual == expected,
        "expected acknowledgement {expected}, got {actual}"
    );
    Ok(())
}

#[then(r#"the outbox holds {count:usize} messages with batch sizes "{sizes}""#)]
fn outbox_holds(
    world: &PublicationWorld,
    count: usize,
    sizes: String,
) -> Result<(), eyre::Report> {
    let messages = world.outbox.messages()?;
    eyre::ensure!(
        messages.len() == count,
        "expected {count} messages, found {}",
        messages.len()
    );

    let expected: Vec<usize> = sizes
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()?;
    let actual: Vec<usize> = messages.iter().map(|message| message.bcc().len()).collect();
    eyre::ensure!(
        actual == expected,
        "expected batch sizes {expected:?}, found {actual:?}"
    );
    Ok(())
}

#[then(r#"every message carries the subject of task "{name}""#)]
fn messages_carry_subject(world: &PublicationWorld, name: String) -> Result<(), eyre::Report> {
    let subject = format!("Press release {name}");
    let messages = world.outbox.messages()?;
    eyre::ensure!(
        messages.iter().all(|message| message.subject() == subject),
        "not every message has subject {subject}"
    );
    Ok(())
}

#[then(r#"task "{name}" has status "{status}""#)]
fn task_has_status(
    world: &PublicationWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let seeded = world
        .seeded
        .get(&name)
        .ok_or_else(|| eyre::eyre!("task {name} was not seeded"))?;
    let stored = run_async(world.tasks.find_by_id(seeded.graph(), seeded.id()))?
        .ok_or_else(|| eyre::eyre!("task {name} is missing from the store"))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected task {name} to be {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then("the outbox is empty")]
fn outbox_is_empty(world: &PublicationWorld) -> Result<(), eyre::Report> {
    let messages = world.outbox.messages()?;
    eyre::ensure!(
        messages.is_empty(),
        "expected no messages, found {}",
        messages.len()
    );
    Ok(())
}
