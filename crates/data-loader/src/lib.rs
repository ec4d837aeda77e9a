//! # Data Loader Crate
//!
//! This crate loads the respondent roster and turns it into the immutable
//! base table every query runs against.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (RawRecord, Record, Roster, CategoricalField)
//! - **parser**: Parse the roster CSV export into raw rows
//! - **derive**: Derived time fields (hours, duration, time slot label)
//! - **codec**: Bidirectional category <-> code mapping and selectors
//! - **index**: Build the Roster from parsed rows
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{CategoricalField, Roster};
//! use std::path::Path;
//!
//! let roster = Roster::load_from_file(Path::new("data/roster.csv"))?;
//!
//! let specialities = roster.codecs().get(CategoricalField::Speciality);
//! let code = specialities.encode("Cardiology")?;
//! assert_eq!(specialities.decode(code)?, "Cardiology");
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod derive;
pub mod codec;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use codec::{ALL_SENTINEL, CategoryCodec, CodecSet, Selector};
pub use derive::{DerivedTimes, derive_times, format_time_slot, parse_slot_start};
pub use types::{
    // Type aliases
    Npi,
    CategoryCode,
    // Core types
    RawRecord,
    Record,
    Roster,
    RosterStats,
    // Enums
    CategoricalField,
};
