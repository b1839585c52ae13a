//! Adapter implementations of the publication ports.

pub mod memory;
pub mod postgres;
pub mod template;
