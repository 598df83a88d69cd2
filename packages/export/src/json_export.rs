//! JSON writer.
//!
//! Records are written as an array, values kept native (lists stay arrays),
//! pretty-printed with four-space indentation. No records produces an object
//! carrying the "no results" note instead of an empty array.

use std::path::Path;

use citius_record_models::{CaseRecord, fields};
use serde::Serialize;

use crate::{
    ExportError, NO_RESULTS_NOTE, SIMPLIFIED_NOTE, SIMPLIFIED_RESULTS, Written, dump_record,
};

/// Renders `records`, or the "no results" object when empty.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn render_json(records: &[CaseRecord]) -> Result<Vec<u8>, ExportError> {
    if records.is_empty() {
        return to_pretty(&CaseRecord::new().with(fields::OBSERVACAO, NO_RESULTS_NOTE));
    }
    to_pretty(&records)
}

/// Renders the simplified report written when the full JSON fails.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn render_json_error_report(
    error: &str,
    records: &[CaseRecord],
) -> Result<Vec<u8>, ExportError> {
    let dumps: Vec<String> = records.iter().map(dump_record).collect();
    to_pretty(
        &CaseRecord::new()
            .with(fields::ERRO, error)
            .with(fields::OBSERVACAO, SIMPLIFIED_NOTE)
            .with(SIMPLIFIED_RESULTS, dumps),
    )
}

/// Writes `records` to `path`, falling back to the simplified report.
///
/// # Errors
///
/// Returns [`ExportError`] if neither the full file nor the report could be
/// written.
pub fn save_json(records: &[CaseRecord], path: &Path) -> Result<Written, ExportError> {
    match write_full(records, path) {
        Ok(written) => {
            log::info!("Saved {} records to {}", records.len(), path.display());
            Ok(written)
        }
        Err(e) => {
            log::error!("Failed to save JSON {}: {e}", path.display());
            let report = render_json_error_report(&e.to_string(), records)?;
            std::fs::write(path, report)?;
            log::warn!("Saved simplified JSON report to {}", path.display());
            Ok(Written::Simplified)
        }
    }
}

fn write_full(records: &[CaseRecord], path: &Path) -> Result<Written, ExportError> {
    std::fs::write(path, render_json(records)?)?;
    Ok(if records.is_empty() {
        Written::Empty
    } else {
        Written::Full
    })
}

fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}
