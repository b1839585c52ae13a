//! When steps for publication pipeline BDD scenarios.

use super::world::{PublicationWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the delta trigger fires")]
fn delta_trigger_fires(world: &mut PublicationWorld) -> Result<(), eyre::Report> {
    let pipeline = world.pipeline()?;
    let report = run_async(pipeline.discover_and_claim()).wrap_err("discover and claim tasks")?;

    let acknowledgement = if report.only_failures() {
        "error"
    } else if report.has_claims() {
        "accepted"
    } else {
        "no content"
    };
    world.acknowledgement = Some(acknowledgement.to_owned());

    run_async(pipeline.process_all(report.claimed));
    Ok(())
}
