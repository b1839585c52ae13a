//! HTTP trigger reacting to delta notifications.

pub mod delta;
mod routes;

pub use delta::{ChangeSet, Term, Triple, mentions_channel};
pub use routes::router;
