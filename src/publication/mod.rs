//! Publication task processing.
//!
//! Tasks scheduled for the mailing-list channel are discovered, claimed and
//! driven through rendering, recipient batching and outbox dispatch to a
//! terminal status. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
