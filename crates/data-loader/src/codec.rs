//! Bidirectional category codecs.
//!
//! Each categorical field maps its distinct string values to dense integer
//! codes. Codes follow the sorted order of the distinct values, so the same
//! dataset always yields the same mapping. A codec must be built over the
//! full roster: building it from a filtered subset would silently renumber
//! the codes.

use crate::error::{DataLoadError, Result};
use crate::types::{CategoricalField, CategoryCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Label that selects every value of a field
pub const ALL_SENTINEL: &str = "All";

/// A resolved categorical selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// Matches every record
    #[default]
    AllValues,
    /// Matches records whose code equals this one
    SpecificValue(CategoryCode),
}

impl Selector {
    /// Whether a record's code satisfies this selector
    pub fn matches(self, code: CategoryCode) -> bool {
        match self {
            Selector::AllValues => true,
            Selector::SpecificValue(selected) => selected == code,
        }
    }
}

/// String <-> code mapping for one categorical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCodec {
    field: CategoricalField,
    encode_map: HashMap<String, CategoryCode>,
    /// Index is the code
    decode_map: Vec<String>,
}

impl CategoryCodec {
    /// Build the codec from every raw value of `field` across the dataset.
    ///
    /// Distinct values are sorted and each gets its position as its code.
    pub fn build<I, S>(field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        let decode_map: Vec<String> = distinct.into_iter().collect();
        let encode_map = decode_map
            .iter()
            .enumerate()
            .map(|(code, value)| (value.clone(), code as CategoryCode))
            .collect();

        Self {
            field,
            encode_map,
            decode_map,
        }
    }

    /// Field this codec belongs to
    pub fn field(&self) -> CategoricalField {
        self.field
    }

    /// Code for a value seen at build time
    pub fn encode(&self, value: &str) -> Result<CategoryCode> {
        self.encode_map
            .get(value)
            .copied()
            .ok_or_else(|| DataLoadError::UnknownCategory {
                field: self.field.to_string(),
                value: value.to_string(),
            })
    }

    /// Original value for a code in `[0, k)`
    pub fn decode(&self, code: CategoryCode) -> Result<&str> {
        self.decode_map
            .get(code as usize)
            .map(String::as_str)
            .ok_or_else(|| DataLoadError::UnknownCode {
                field: self.field.to_string(),
                code,
            })
    }

    /// Resolve a user-facing selector label.
    ///
    /// `"All"` means no filter on this field. Any other label must be part of
    /// the vocabulary.
    pub fn lookup_code_for_selection(&self, label: &str) -> Result<Selector> {
        if label == ALL_SENTINEL {
            return Ok(Selector::AllValues);
        }
        self.encode(label).map(Selector::SpecificValue)
    }

    /// Distinct values in code order
    pub fn labels(&self) -> &[String] {
        &self.decode_map
    }

    /// Choices offered to the user: the sentinel followed by every value
    pub fn selector_options(&self) -> Vec<&str> {
        std::iter::once(ALL_SENTINEL)
            .chain(self.decode_map.iter().map(String::as_str))
            .collect()
    }

    /// Number of distinct values (`k`)
    pub fn len(&self) -> usize {
        self.decode_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decode_map.is_empty()
    }
}

/// The codecs for all three categorical fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecSet {
    pub speciality: CategoryCodec,
    pub region: CategoryCodec,
    pub state: CategoryCodec,
}

impl CodecSet {
    pub fn get(&self, field: CategoricalField) -> &CategoryCodec {
        match field {
            CategoricalField::Speciality => &self.speciality,
            CategoricalField::Region => &self.region,
            CategoricalField::State => &self.state,
        }
    }
}
