//! Building the roster from parsed rows.
//!
//! Loading happens once per process:
//! 1. Parse the roster file
//! 2. Build one codec per categorical field over the full row set
//! 3. Derive time fields and encode categories for every row
//! 4. Report data oddities (negative durations, duplicate identifiers)
//!
//! Engagement labels are attached afterwards with [`Roster::with_engagement`],
//! once the classifier has seen the encoded rows.

use crate::codec::{CategoryCodec, CodecSet};
use crate::derive::derive_times;
use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

impl Roster {
    /// Load, derive and encode the roster stored at `path`
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading roster from {:?}", path);

        let raw = parser::parse_roster(path)?;
        info!("Parsed {} roster rows", raw.len());

        Self::from_raw(raw)
    }

    /// Build the roster from already parsed rows.
    ///
    /// Codecs are built from `raw` as a whole before any row is encoded, so
    /// the codes never depend on a subset of the data.
    pub fn from_raw(raw: Vec<RawRecord>) -> Result<Self> {
        let codecs = build_codecs(&raw);

        // Rows are independent; collect keeps input order
        let records = raw
            .par_iter()
            .map(|row| encode_record(row, &codecs))
            .collect::<Result<Vec<Record>>>()?;

        let roster = Roster { records, codecs };
        roster.report_anomalies();

        info!(
            "Roster ready: {} records, {} specialities, {} regions, {} states",
            roster.records.len(),
            roster.codecs.speciality.len(),
            roster.codecs.region.len(),
            roster.codecs.state.len()
        );
        Ok(roster)
    }

    /// Attach the classifier's labels, one per record in roster order
    pub fn with_engagement(mut self, labels: Vec<bool>) -> Result<Self> {
        if labels.len() != self.records.len() {
            return Err(DataLoadError::LabelCountMismatch {
                expected: self.records.len(),
                found: labels.len(),
            });
        }

        for (record, engaged) in self.records.iter_mut().zip(labels) {
            record.engaged = engaged;
        }

        info!(
            "Attached engagement labels: {} of {} records engaged",
            self.records.iter().filter(|r| r.engaged).count(),
            self.records.len()
        );
        Ok(self)
    }

    /// Summary counts for display and diagnostics
    pub fn stats(&self) -> RosterStats {
        RosterStats {
            records: self.records.len(),
            engaged: self.records.iter().filter(|r| r.engaged).count(),
            negative_durations: self.count_negative_durations(),
            duplicate_ids: self.count_duplicate_ids(),
            specialities: self.codecs.speciality.len(),
            regions: self.codecs.region.len(),
            states: self.codecs.state.len(),
        }
    }

    fn count_negative_durations(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.session_duration_minutes < 0.0)
            .count()
    }

    fn count_duplicate_ids(&self) -> usize {
        let mut seen = HashSet::with_capacity(self.records.len());
        self.records.iter().filter(|r| !seen.insert(r.npi)).count()
    }

    /// Negative durations and repeated identifiers are kept as-is
    fn report_anomalies(&self) {
        let negative = self.count_negative_durations();
        if negative > 0 {
            warn!(
                "{} records have a logout before their login; durations kept negative",
                negative
            );
        }

        let duplicates = self.count_duplicate_ids();
        if duplicates > 0 {
            warn!("{} records repeat an NPI seen earlier in the roster", duplicates);
        }
    }
}

fn build_codecs(raw: &[RawRecord]) -> CodecSet {
    let codec = |field: CategoricalField| {
        CategoryCodec::build(field, raw.iter().map(|r| r.category(field)))
    };

    CodecSet {
        speciality: codec(CategoricalField::Speciality),
        region: codec(CategoricalField::Region),
        state: codec(CategoricalField::State),
    }
}

fn encode_record(row: &RawRecord, codecs: &CodecSet) -> Result<Record> {
    let derived = derive_times(row.login, row.logout);

    Ok(Record {
        npi: row.npi,
        login_time: derived.login_time,
        logout_time: derived.logout_time,
        login_hour: derived.login_hour,
        logout_hour: derived.logout_hour,
        session_duration_minutes: derived.session_duration_minutes,
        time_slot: derived.time_slot,
        speciality: codecs.speciality.encode(&row.speciality)?,
        region: codecs.region.encode(&row.region)?,
        state: codecs.state.encode(&row.state)?,
        usage_time_mins: row.usage_time_mins,
        survey_attempts: row.survey_attempts,
        engaged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use std::io::Write;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn raw(npi: Npi, login: NaiveDateTime, logout: NaiveDateTime, speciality: &str, state: &str) -> RawRecord {
        RawRecord {
            npi,
            login,
            logout,
            speciality: speciality.to_string(),
            region: "Northeast".to_string(),
            state: state.to_string(),
            usage_time_mins: 30.0,
            survey_attempts: 2,
        }
    }

    fn sample_raw() -> Vec<RawRecord> {
        vec![
            raw(1, ts(8, 0), ts(9, 0), "Neurology", "NY"),
            raw(2, ts(7, 0), ts(10, 0), "Cardiology", "MA"),
            raw(3, ts(22, 0), ts(23, 30), "Cardiology", "NY"),
        ]
    }

    #[test]
    fn test_from_raw_encodes_and_derives() {
        let roster = Roster::from_raw(sample_raw()).unwrap();

        assert_eq!(roster.len(), 3);
        let first = &roster.records()[0];
        assert_eq!(first.npi, 1);
        assert_eq!(first.speciality, 1); // Cardiology=0, Neurology=1
        assert_eq!(first.state, 1); // MA=0, NY=1
        assert_eq!(first.region, 0);
        assert_eq!(first.login_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(first.session_duration_minutes, 60.0);
        assert_eq!(first.time_slot, "08:00:00 - 09:00:00");
        assert!(!first.engaged);
    }

    #[test]
    fn test_record_order_is_preserved() {
        let roster = Roster::from_raw(sample_raw()).unwrap();
        let ids: Vec<Npi> = roster.records().iter().map(|r| r.npi).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_with_engagement() {
        let roster = Roster::from_raw(sample_raw())
            .unwrap()
            .with_engagement(vec![true, false, true])
            .unwrap();

        assert!(roster.get_record(1).unwrap().engaged);
        assert!(!roster.get_record(2).unwrap().engaged);
        assert_eq!(roster.stats().engaged, 2);
    }

    #[test]
    fn test_with_engagement_rejects_wrong_count() {
        let err = Roster::from_raw(sample_raw())
            .unwrap()
            .with_engagement(vec![true])
            .unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::LabelCountMismatch { expected: 3, found: 1 }
        ));
    }

    #[test]
    fn test_stats_counts_anomalies() {
        let mut rows = sample_raw();
        rows.push(raw(1, ts(12, 0), ts(11, 0), "Oncology", "TX"));
        let stats = Roster::from_raw(rows).unwrap().stats();

        assert_eq!(stats.records, 4);
        assert_eq!(stats.negative_durations, 1);
        assert_eq!(stats.duplicate_ids, 1);
        assert_eq!(stats.specialities, 3);
        assert_eq!(stats.states, 3);
        assert_eq!(stats.regions, 1);
    }

    #[test]
    fn test_empty_roster() {
        let roster = Roster::from_raw(Vec::new()).unwrap();
        assert!(roster.is_empty());
        assert!(roster.codecs().speciality.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "NPI,Login Time,Logout Time,Speciality,Region,State,Usage Time (mins),Count of Survey Attempts"
        )
        .unwrap();
        writeln!(file, "7,2025-03-10 06:30:00,2025-03-10 07:00:00,Oncology,West,CA,15,1").unwrap();

        let roster = Roster::load_from_file(file.path()).unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.codecs().state.labels(), &["CA"]);
    }
}
