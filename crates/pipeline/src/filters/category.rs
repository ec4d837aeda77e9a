//! Filter to keep records matching one categorical selector.

use crate::selection::FilterSelection;
use crate::traits::Filter;
use data_loader::{CategoricalField, Record};

/// Keeps records whose code for `field` satisfies the selection.
///
/// An `AllValues` selector lets every record through. Comparison is on
/// codes, which the selection resolved with the roster's own codecs.
pub struct CategoryFilter {
    field: CategoricalField,
}

impl CategoryFilter {
    pub fn new(field: CategoricalField) -> Self {
        Self { field }
    }

    pub fn field(&self) -> CategoricalField {
        self.field
    }
}

impl Filter for CategoryFilter {
    fn name(&self) -> &str {
        match self.field {
            CategoricalField::Speciality => "SpecialityFilter",
            CategoricalField::Region => "RegionFilter",
            CategoricalField::State => "StateFilter",
        }
    }

    fn matches(&self, record: &Record, selection: &FilterSelection) -> bool {
        selection
            .selector(self.field)
            .matches(record.category_code(self.field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::record;
    use data_loader::Selector;

    #[test]
    fn test_category_filter() {
        let records = [
            record(1, (8, 0), (9, 0), 0),
            record(2, (8, 0), (9, 0), 1),
            record(3, (8, 0), (9, 0), 0),
        ];
        let filter = CategoryFilter::new(CategoricalField::Speciality);

        let all = FilterSelection::default();
        assert_eq!(filter.apply(records.iter().collect(), &all).len(), 3);

        let only_zero = all.with_selector(CategoricalField::Speciality, Selector::SpecificValue(0));
        let filtered = filter.apply(records.iter().collect(), &only_zero);
        let ids: Vec<u64> = filtered.iter().map(|r| r.npi).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_other_fields_are_ignored() {
        let r = record(1, (8, 0), (9, 0), 5);
        let selection = FilterSelection::default()
            .with_selector(CategoricalField::State, Selector::SpecificValue(9));

        assert!(CategoryFilter::new(CategoricalField::Speciality).matches(&r, &selection));
        assert!(!CategoryFilter::new(CategoricalField::State).matches(&r, &selection));
    }

    #[test]
    fn test_filter_names() {
        assert_eq!(CategoryFilter::new(CategoricalField::Region).name(), "RegionFilter");
    }
}
