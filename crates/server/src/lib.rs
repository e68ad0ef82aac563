//! HTTP surface and process wiring for the burstrec recording pipeline.
//!
//! Exposed as a library so integration tests can build the router
//! in-process against mock collaborators.

pub mod api;
pub mod metrics;
pub mod state;
