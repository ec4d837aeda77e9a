//! Server crate for the roster availability engine.
//!
//! This crate contains the service that loads the roster once, labels it
//! with the engagement model and answers availability queries against it.

pub mod orchestrator;

pub use orchestrator::{AvailabilityService, QueryResult};
