//! Pipeline for filtering and projecting roster records.
//!
//! This crate provides:
//! - SelectionRequest / FilterSelection: what the user picked, resolved once
//! - Filter trait and implementations for record filtering
//! - FilterPipeline for composing filters
//! - FeatureEngineer for computing engagement model inputs
//! - ResultProjector for decoding and ordering the result table
//!
//! ## Architecture
//! The pipeline processes records in stages:
//! 1. Features are computed once at load time and sent to the engagement model
//! 2. Per interaction, filters narrow a borrowed view of the roster
//! 3. The projector decodes categories and sorts by time slot start
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, ResultProjector, SelectionRequest};
//!
//! let selection = SelectionRequest::default().resolve(roster.codecs())?;
//! let view = FilterPipeline::availability().apply(roster.records(), &selection);
//! let rows = ResultProjector::new().project(&view, roster.codecs())?;
//! ```

pub mod selection;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod features;
pub mod projector;

// Re-export main types
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use features::{FeatureEngineer, RecordFeatures};
pub use projector::{COLUMN_HEADERS, ResultProjector, ResultRow};
pub use selection::{
    FilterSelection, SelectionRequest, TimeWindow, WindowPolicy, default_end, default_start,
    parse_time_of_day,
};
