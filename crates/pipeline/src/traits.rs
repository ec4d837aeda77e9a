//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to a borrowed view of the roster.

use crate::selection::FilterSelection;
use data_loader::Record;

/// Core trait for filtering records.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `matches` is a pure predicate over one record; filters never mutate
///   the roster
/// - `apply` narrows a view of borrowed records, so the base table is
///   never copied or modified
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Whether `record` passes this filter for the given selection
    fn matches(&self, record: &Record, selection: &FilterSelection) -> bool;

    /// Keep the records that pass, preserving their order.
    fn apply<'a>(&self, records: Vec<&'a Record>, selection: &FilterSelection) -> Vec<&'a Record> {
        records
            .into_iter()
            .filter(|record| self.matches(record, selection))
            .collect()
    }
}
