//! Spreadsheet export of result tables.
//!
//! The export is a single-sheet Office Open XML workbook with the result
//! columns in display order and a bold header row. The bytes are built in
//! memory; writing them anywhere is up to the caller.

use pipeline::{COLUMN_HEADERS, ResultRow, TimeWindow};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Name of the only worksheet in an export
pub const SHEET_NAME: &str = "Available Doctors";

/// Media type of the exported file
pub const MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to build workbook: {0}")]
    Workbook(#[from] XlsxError),

    #[error("Failed to write export to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Serialize rows into workbook bytes.
///
/// An empty slice still produces a valid workbook holding only the header.
pub fn export_xlsx(rows: &[ResultRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in COLUMN_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        worksheet.write_number(r, 0, row.npi as f64)?;
        worksheet.write_string(r, 1, &row.state)?;
        worksheet.write_string(r, 2, &row.region)?;
        worksheet.write_string(r, 3, &row.speciality)?;
        worksheet.write_number(r, 4, row.usage_time_mins)?;
        worksheet.write_number(r, 5, row.survey_attempts as f64)?;
        worksheet.write_string(r, 6, &row.time_slot)?;
    }
    worksheet.autofit();

    let bytes = workbook.save_to_buffer()?;
    debug!("Built workbook with {} rows ({} bytes)", rows.len(), bytes.len());
    Ok(bytes)
}

/// File name offered for an export of `window`, e.g.
/// `available_doctors_06_00_to_23_59.xlsx`
pub fn suggested_file_name(window: &TimeWindow) -> String {
    format!(
        "available_doctors_{}_to_{}.xlsx",
        window.start.format("%H_%M"),
        window.end.format("%H_%M")
    )
}

/// A finished export, ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the workbook into `dir` under its suggested name
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes).map_err(|source| ExportError::Write {
            path: path.display().to_string(),
            source,
        })?;

        info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Produces export artifacts for result tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Self
    }

    /// Export `rows` selected with `window`.
    ///
    /// Returns `None` for an empty table: there is nothing to offer.
    pub fn export(&self, rows: &[ResultRow], window: &TimeWindow) -> Result<Option<ExportArtifact>> {
        if rows.is_empty() {
            debug!("Nothing to export");
            return Ok(None);
        }

        Ok(Some(ExportArtifact {
            file_name: suggested_file_name(window),
            mime_type: MIME_TYPE,
            bytes: export_xlsx(rows)?,
        }))
    }
}
