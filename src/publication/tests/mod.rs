//! Unit tests for the publication module.
//!
//! Tests are organised by concern: domain rules, recipient merging and
//! batching, outbox dispatch, the pipeline state machine, template
//! rendering and row mapping.
