//! Step definitions for publication pipeline behaviour tests.

pub mod then;
pub mod when;
