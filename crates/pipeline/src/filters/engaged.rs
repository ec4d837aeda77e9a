//! Optional filter on the engagement label.

use crate::selection::FilterSelection;
use crate::traits::Filter;
use data_loader::Record;

/// Keeps engaged records when the selection asks for them; otherwise a no-op.
pub struct EngagedFilter;

impl Filter for EngagedFilter {
    fn name(&self) -> &str {
        "EngagedFilter"
    }

    fn matches(&self, record: &Record, selection: &FilterSelection) -> bool {
        !selection.engaged_only || record.engaged
    }
}
