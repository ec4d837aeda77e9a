//! Turning a filtered view into display rows.
//!
//! The projector keeps a fixed set of columns, decodes the categorical codes
//! back to their labels and orders rows by the start of their time slot.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use data_loader::{CodecSet, Npi, Record, parse_slot_start};
use serde::{Deserialize, Serialize};

/// Display / export column headers, in order
pub const COLUMN_HEADERS: [&str; 7] = [
    "NPI",
    "State",
    "Region",
    "Speciality",
    "Usage Time (mins)",
    "Count of Survey Attempts",
    "Time Slot",
];

/// One row of the result table, categories decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "NPI")]
    pub npi: Npi,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Speciality")]
    pub speciality: String,
    #[serde(rename = "Usage Time (mins)")]
    pub usage_time_mins: f64,
    #[serde(rename = "Count of Survey Attempts")]
    pub survey_attempts: u32,
    #[serde(rename = "Time Slot")]
    pub time_slot: String,
}

/// Projects, decodes and sorts filtered records.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultProjector;

impl ResultProjector {
    pub fn new() -> Self {
        Self
    }

    /// Build the result table for a filtered view.
    ///
    /// Rows are sorted by the start time parsed from `time_slot`. The sort is
    /// stable, so rows with the same start keep their filtered order.
    pub fn project(&self, records: &[&Record], codecs: &CodecSet) -> Result<Vec<ResultRow>> {
        let mut keyed = records
            .iter()
            .map(|record| -> Result<(NaiveTime, ResultRow)> {
                let start = parse_slot_start(&record.time_slot).ok_or_else(|| {
                    anyhow!(
                        "Time slot '{}' of NPI {} has no readable start time",
                        record.time_slot,
                        record.npi
                    )
                })?;
                Ok((start, self.decode_row(record, codecs)?))
            })
            .collect::<Result<Vec<_>>>()?;

        keyed.sort_by_key(|(start, _)| *start);
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }

    fn decode_row(&self, record: &Record, codecs: &CodecSet) -> Result<ResultRow> {
        Ok(ResultRow {
            npi: record.npi,
            state: codecs.state.decode(record.state).context("Decoding state")?.to_string(),
            region: codecs.region.decode(record.region).context("Decoding region")?.to_string(),
            speciality: codecs
                .speciality
                .decode(record.speciality)
                .context("Decoding speciality")?
                .to_string(),
            usage_time_mins: record.usage_time_mins,
            survey_attempts: record.survey_attempts,
            time_slot: record.time_slot.clone(),
        })
    }
}
