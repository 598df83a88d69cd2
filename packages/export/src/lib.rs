#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Flat-file export of case records.
//!
//! Every run leaves a `<base>.csv` and a `<base>.json` behind: the records,
//! a "no results" note when there are none, or a simplified error report
//! when the full rendering could not be written. The two files are written
//! independently; one failing does not stop the other.

pub mod csv_export;
pub mod json_export;

use std::path::{Path, PathBuf};

use citius_record_models::CaseRecord;

pub use csv_export::save_csv;
pub use json_export::save_json;

/// Note written when there are no records.
pub const NO_RESULTS_NOTE: &str = "Nenhum resultado encontrado";

/// Note carried by the simplified error reports.
pub const SIMPLIFIED_NOTE: &str = "Erro ao salvar resultados em formato completo";

/// Key of the record dumps in the simplified JSON report.
pub const SIMPLIFIED_RESULTS: &str = "Resultados_Simplificados";

/// Errors raised while writing export files.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The CSV writer could not flush its buffer.
    #[error("CSV flush error: {0}")]
    Flush(String),
}

/// What ended up in an export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    /// The records.
    Full,
    /// The "no results" note.
    Empty,
    /// The simplified error report.
    Simplified,
}

/// The pair of output files for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    /// `<base>.csv`
    pub csv: PathBuf,
    /// `<base>.json`
    pub json: PathBuf,
}

impl ExportPaths {
    /// Derives both paths from `base`, dropping any extension it has.
    #[must_use]
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let stem = base.as_ref().with_extension("");
        Self {
            csv: stem.with_extension("csv"),
            json: stem.with_extension("json"),
        }
    }

    /// Creates the directory the files go in.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the directory cannot be created.
    pub fn ensure_parent(&self) -> Result<(), ExportError> {
        if let Some(parent) = self.csv.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Outcome of [`save_results`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// Where the files went.
    pub paths: ExportPaths,
    /// Contents of the CSV file.
    pub csv: Written,
    /// Contents of the JSON file.
    pub json: Written,
}

/// Writes `<base>.csv` and `<base>.json`.
///
/// Both files are attempted even if the first one fails.
///
/// # Errors
///
/// Returns [`ExportError`] if the output directory cannot be created, or if
/// a file could be written neither in full nor as a simplified report.
pub fn save_results(
    records: &[CaseRecord],
    base: impl AsRef<Path>,
) -> Result<ExportReport, ExportError> {
    let paths = ExportPaths::from_base(base);
    paths.ensure_parent()?;

    let csv = save_csv(records, &paths.csv);
    let json = save_json(records, &paths.json);

    Ok(ExportReport {
        csv: csv?,
        json: json?,
        paths,
    })
}

/// One-line rendering of a record for the simplified reports.
#[must_use]
pub fn dump_record(record: &CaseRecord) -> String {
    let fields: Vec<String> = record
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();
    format!("{{{}}}", fields.join(", "))
}
