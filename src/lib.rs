//! Publication mailer: mailing-list distribution of scheduled publications.
//!
//! The service reacts to delta notifications, discovers publication tasks
//! scheduled for the mailing-list channel, and drives each one through
//! rendering, recipient batching and outbox dispatch.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, templates)
//!
//! # Modules
//!
//! - [`publication`]: Task lifecycle, recipients and dispatch
//! - [`trigger`]: HTTP endpoint receiving delta notifications
//! - [`config`]: Environment-driven configuration
//! - [`telemetry`]: Logging set-up

pub mod config;
pub mod publication;
pub mod telemetry;
pub mod trigger;
