//! Feature vectors for the engagement model.
//!
//! The model was trained on eight numeric columns in a fixed order:
//! state, region, speciality, login hour, logout hour, session duration,
//! usage time and survey attempts. Categorical columns carry the codes from
//! the roster's codecs, which is why those codecs must never be rebuilt.

use data_loader::{CategoryCode, Npi, Record};
use rayon::prelude::*;
use serde::Serialize;

/// Model input for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordFeatures {
    pub npi: Npi,

    // Encoded categories
    pub state: CategoryCode,
    pub region: CategoryCode,
    pub speciality: CategoryCode,

    // Session timing
    pub login_hour: u32,
    pub logout_hour: u32,
    pub session_duration_minutes: f64,

    // Activity
    pub usage_time_mins: f64,
    pub survey_attempts: u32,
}

impl RecordFeatures {
    pub fn from_record(record: &Record) -> Self {
        Self {
            npi: record.npi,
            state: record.state,
            region: record.region,
            speciality: record.speciality,
            login_hour: record.login_hour,
            logout_hour: record.logout_hour,
            session_duration_minutes: record.session_duration_minutes,
            usage_time_mins: record.usage_time_mins,
            survey_attempts: record.survey_attempts,
        }
    }

    /// The eight model inputs in training order
    pub fn as_vector(&self) -> [f64; 8] {
        [
            self.state as f64,
            self.region as f64,
            self.speciality as f64,
            self.login_hour as f64,
            self.logout_hour as f64,
            self.session_duration_minutes,
            self.usage_time_mins,
            self.survey_attempts as f64,
        ]
    }
}

/// Computes model inputs for records in parallel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Compute features for all records.
    ///
    /// # Returns
    /// Vec of RecordFeatures, one per record, in the same order
    pub fn compute_features(&self, records: &[Record]) -> Vec<RecordFeatures> {
        records.par_iter().map(RecordFeatures::from_record).collect()
    }
}
