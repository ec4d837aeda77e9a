//! Core domain types for the respondent roster.
//!
//! A roster row starts life as a [`RawRecord`] straight out of the input
//! file. Loading turns it into a [`Record`]: timestamps are reduced to
//! time-of-day plus derived fields, and the three categorical attributes are
//! replaced by their integer codes. The [`Roster`] owns every record together
//! with the [`CodecSet`] that produced those codes.

use crate::codec::CodecSet;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// National Provider Identifier of a respondent
pub type Npi = u64;

/// Dense integer code of a categorical value, in `[0, k)` for its field
pub type CategoryCode = u32;

// =============================================================================
// Categorical Fields
// =============================================================================

/// The three categorical attributes of a record.
///
/// Each one gets its own codec, built over the full roster at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    Speciality,
    Region,
    State,
}

impl CategoricalField {
    /// All fields, in the order the selectors are presented
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Speciality,
        CategoricalField::Region,
        CategoricalField::State,
    ];

    /// Column name used in the input file and in exported sheets
    pub fn column_name(self) -> &'static str {
        match self {
            CategoricalField::Speciality => "Speciality",
            CategoricalField::Region => "Region",
            CategoricalField::State => "State",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

// =============================================================================
// Records
// =============================================================================

/// One roster row as read from the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub npi: Npi,
    pub login: NaiveDateTime,
    pub logout: NaiveDateTime,
    pub speciality: String,
    pub region: String,
    pub state: String,
    pub usage_time_mins: f64,
    pub survey_attempts: u32,
}

impl RawRecord {
    /// Raw string value of a categorical field
    pub fn category(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Speciality => &self.speciality,
            CategoricalField::Region => &self.region,
            CategoricalField::State => &self.state,
        }
    }
}

/// A loaded, derived and encoded roster row.
///
/// Fields are public for reading; records are only built by
/// [`Roster::from_raw`] and never mutated once the roster is shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub npi: Npi,

    // Time-of-day view of the session
    pub login_time: NaiveTime,
    pub logout_time: NaiveTime,
    pub login_hour: u32,
    pub logout_hour: u32,
    /// Minutes between login and logout; negative when logout precedes login
    pub session_duration_minutes: f64,
    /// `"HH:MM:SS - HH:MM:SS"`
    pub time_slot: String,

    // Encoded categories
    pub speciality: CategoryCode,
    pub region: CategoryCode,
    pub state: CategoryCode,

    pub usage_time_mins: f64,
    pub survey_attempts: u32,

    /// Label produced by the engagement model
    pub engaged: bool,
}

impl Record {
    /// Encoded value of a categorical field
    pub fn category_code(&self, field: CategoricalField) -> CategoryCode {
        match field {
            CategoricalField::Speciality => self.speciality,
            CategoricalField::Region => self.region,
            CategoricalField::State => self.state,
        }
    }
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Summary of a loaded roster, computed on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterStats {
    pub records: usize,
    pub engaged: usize,
    /// Records whose logout precedes their login
    pub negative_durations: usize,
    /// Records whose NPI already appeared earlier in the roster
    pub duplicate_ids: usize,
    pub specialities: usize,
    pub regions: usize,
    pub states: usize,
}

// =============================================================================
// Roster - The Base Table
// =============================================================================

/// The base table: every record plus the codecs used to encode them.
///
/// Built once per process. After engagement labels are attached it is shared
/// read-only (usually behind an `Arc`) and every query works on borrowed
/// views of [`Roster::records`].
#[derive(Debug, Clone)]
pub struct Roster {
    pub(crate) records: Vec<Record>,
    pub(crate) codecs: CodecSet,
}

impl Roster {
    /// All records, in input order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Codecs built over the full roster at load time
    pub fn codecs(&self) -> &CodecSet {
        &self.codecs
    }

    /// Look up a record by identifier (first match in input order)
    pub fn get_record(&self, npi: Npi) -> Option<&Record> {
        self.records.iter().find(|r| r.npi == npi)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
