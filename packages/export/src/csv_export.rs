//! CSV writer.
//!
//! Columns are the union of field names over all records, sorted, with the
//! multi-valued fields appended at the end when any record has them. List
//! values are joined with `"; "`, so reading a list back from the CSV is
//! lossy; the JSON file keeps them intact.

use std::collections::BTreeSet;
use std::path::Path;

use citius_record_models::{CaseRecord, FieldValue, fields};

use crate::{ExportError, NO_RESULTS_NOTE, SIMPLIFIED_NOTE, Written, dump_record};

/// Column order for `records`.
#[must_use]
pub fn columns(records: &[CaseRecord]) -> Vec<String> {
    let scalar: BTreeSet<&str> = records
        .iter()
        .flat_map(CaseRecord::names)
        .filter(|name| !fields::MULTI_VALUED.contains(name))
        .collect();

    let mut columns: Vec<String> = scalar.into_iter().map(str::to_owned).collect();
    for name in fields::MULTI_VALUED {
        if records.iter().any(|r| r.contains(name)) {
            columns.push(name.to_owned());
        }
    }
    columns
}

/// Renders `records` as CSV, or the "no results" note when empty.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn render_csv(records: &[CaseRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = new_writer();

    if records.is_empty() {
        writer.write_record([fields::OBSERVACAO])?;
        writer.write_record([NO_RESULTS_NOTE])?;
    } else {
        let columns = columns(records);
        writer.write_record(&columns)?;
        for record in records {
            writer.write_record(columns.iter().map(|column| {
                record
                    .get(column)
                    .map(FieldValue::flatten)
                    .unwrap_or_default()
            }))?;
        }
    }

    finish(writer)
}

/// Renders the simplified report written when the full CSV fails.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization fails.
pub fn render_csv_error_report(
    error: &str,
    records: &[CaseRecord],
) -> Result<Vec<u8>, ExportError> {
    let mut writer = new_writer();
    writer.write_record([fields::ERRO, fields::OBSERVACAO])?;
    writer.write_record([error, SIMPLIFIED_NOTE])?;
    for (i, record) in records.iter().enumerate() {
        writer.write_record([format!("Resultado {}", i + 1), dump_record(record)])?;
    }
    finish(writer)
}

/// Writes `records` to `path`, falling back to the simplified report.
///
/// # Errors
///
/// Returns [`ExportError`] if neither the full file nor the report could be
/// written.
pub fn save_csv(records: &[CaseRecord], path: &Path) -> Result<Written, ExportError> {
    match write_full(records, path) {
        Ok(written) => {
            log::info!("Saved {} records to {}", records.len(), path.display());
            Ok(written)
        }
        Err(e) => {
            log::error!("Failed to save CSV {}: {e}", path.display());
            let report = render_csv_error_report(&e.to_string(), records)?;
            std::fs::write(path, report)?;
            log::warn!("Saved simplified CSV report to {}", path.display());
            Ok(Written::Simplified)
        }
    }
}

fn write_full(records: &[CaseRecord], path: &Path) -> Result<Written, ExportError> {
    std::fs::write(path, render_csv(records)?)?;
    Ok(if records.is_empty() {
        Written::Empty
    } else {
        Written::Full
    })
}

fn new_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.error().to_string()))
}
