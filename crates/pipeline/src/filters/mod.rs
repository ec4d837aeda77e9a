//! Filter implementations for the availability pipeline.
//!
//! This module contains all the concrete filter implementations
//! that can be composed into a FilterPipeline.

pub mod time_window;
pub mod category;
pub mod engaged;

// Re-export for convenience
pub use time_window::TimeWindowFilter;
pub use category::CategoryFilter;
pub use engaged::EngagedFilter;
