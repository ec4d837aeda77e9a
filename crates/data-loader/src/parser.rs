//! Parser for roster files.
//!
//! The roster is a comma-separated export with a header row. Columns are
//! located by name, so their order does not matter and extra columns are
//! ignored. Fields may be wrapped in double quotes (with `""` as an escaped
//! quote) when they contain commas.
//!
//! Required columns:
//! `NPI, Login Time, Logout Time, Speciality, Region, State,
//! Usage Time (mins), Count of Survey Attempts`

use crate::error::{DataLoadError, Result};
use crate::types::RawRecord;
use chrono::NaiveDateTime;
use std::path::Path;

pub const COL_NPI: &str = "NPI";
pub const COL_LOGIN_TIME: &str = "Login Time";
pub const COL_LOGOUT_TIME: &str = "Logout Time";
pub const COL_SPECIALITY: &str = "Speciality";
pub const COL_REGION: &str = "Region";
pub const COL_STATE: &str = "State";
pub const COL_USAGE_TIME: &str = "Usage Time (mins)";
pub const COL_SURVEY_ATTEMPTS: &str = "Count of Survey Attempts";

/// Timestamp layouts accepted in the login/logout columns
const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Positions of the required columns in the header row
struct ColumnIndex {
    npi: usize,
    login: usize,
    logout: usize,
    speciality: usize,
    region: usize,
    state: usize,
    usage_time: usize,
    survey_attempts: usize,
    width: usize,
}

impl ColumnIndex {
    fn from_header(header: &[String], file: &str) -> Result<Self> {
        let find = |column: &str| {
            header
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}') == column)
                .ok_or_else(|| DataLoadError::MissingColumn {
                    file: file.to_string(),
                    column: column.to_string(),
                })
        };

        Ok(Self {
            npi: find(COL_NPI)?,
            login: find(COL_LOGIN_TIME)?,
            logout: find(COL_LOGOUT_TIME)?,
            speciality: find(COL_SPECIALITY)?,
            region: find(COL_REGION)?,
            state: find(COL_STATE)?,
            usage_time: find(COL_USAGE_TIME)?,
            survey_attempts: find(COL_SURVEY_ATTEMPTS)?,
            width: header.len(),
        })
    }
}

/// Parse a roster file from disk
pub fn parse_roster(path: &Path) -> Result<Vec<RawRecord>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    parse_roster_str(&content, &file)
}

/// Parse roster content; `file` is only used in error messages
pub fn parse_roster_str(content: &str, file: &str) -> Result<Vec<RawRecord>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (header_line, header) = lines.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line: 1,
        reason: "Missing header row".to_string(),
    })?;
    let header = split_fields(header, file, header_line)?;
    let columns = ColumnIndex::from_header(&header, file)?;

    let mut records = Vec::new();
    for (line_no, line) in lines {
        let fields = split_fields(line, file, line_no)?;
        if fields.len() < columns.width {
            return Err(DataLoadError::FieldCountMismatch {
                expected: columns.width,
                found: fields.len(),
                line: line_no,
            });
        }

        let parse_error = |reason: String| DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason,
        };

        let npi = fields[columns.npi].trim();
        let usage_time = fields[columns.usage_time].trim();
        let attempts = fields[columns.survey_attempts].trim();

        let record = RawRecord {
            npi: npi
                .parse()
                .map_err(|e| parse_error(format!("Invalid {}: '{}' ({})", COL_NPI, npi, e)))?,
            login: parse_timestamp(&fields[columns.login])
                .ok_or_else(|| parse_error(format!("Invalid {}: '{}'", COL_LOGIN_TIME, fields[columns.login])))?,
            logout: parse_timestamp(&fields[columns.logout])
                .ok_or_else(|| parse_error(format!("Invalid {}: '{}'", COL_LOGOUT_TIME, fields[columns.logout])))?,
            speciality: fields[columns.speciality].trim().to_string(),
            region: fields[columns.region].trim().to_string(),
            state: fields[columns.state].trim().to_string(),
            usage_time_mins: usage_time.parse().map_err(|e| {
                parse_error(format!("Invalid {}: '{}' ({})", COL_USAGE_TIME, usage_time, e))
            })?,
            survey_attempts: parse_count(attempts).ok_or_else(|| {
                parse_error(format!("Invalid {}: '{}'", COL_SURVEY_ATTEMPTS, attempts))
            })?,
        };

        records.push(record);
    }

    Ok(records)
}

/// Parse a login/logout timestamp in any of the accepted layouts
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Spreadsheet exports sometimes write integer counts as `3.0`
fn parse_count(s: &str) -> Option<u32> {
    if let Ok(count) = s.parse::<u32>() {
        return Some(count);
    }
    let value = s.parse::<f64>().ok()?;
    if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

/// Split one line into fields, honoring double quotes
fn split_fields(line: &str, file: &str, line_no: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\r' if !in_quotes => {}
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: "Unterminated quoted field".to_string(),
        });
    }
    fields.push(current);
    Ok(fields)
}
