//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern. Chaining is a
//! logical AND: a record survives only if every filter keeps it.

use crate::filters::{CategoryFilter, EngagedFilter, TimeWindowFilter};
use crate::selection::FilterSelection;
use crate::traits::Filter;
use data_loader::{CategoricalField, Record};

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::availability();
/// let available = pipeline.apply(roster.records(), &selection);
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The standard availability check: time window, then speciality,
    /// region and state, then the optional engagement filter.
    pub fn availability() -> Self {
        let mut pipeline = Self::new().add_filter(TimeWindowFilter);
        for field in CategoricalField::ALL {
            pipeline = pipeline.add_filter(CategoryFilter::new(field));
        }
        pipeline.add_filter(EngagedFilter)
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Names of the filters, in application order
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Whether a single record passes every filter
    pub fn matches(&self, record: &Record, selection: &FilterSelection) -> bool {
        self.filters.iter().all(|f| f.matches(record, selection))
    }

    /// Apply all filters in sequence to a view of the records.
    ///
    /// The returned view borrows from `records` and keeps their order.
    pub fn apply<'a>(&self, records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
        let mut current: Vec<&'a Record> = records.iter().collect();
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter.apply(current, selection);
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        current
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}
