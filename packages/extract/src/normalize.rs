//! Record Normalizer.
//!
//! Two inputs: a raw text block, parsed with the Field Pattern Library, or a
//! field set already keyed by name (table cells, labelled list spans), which
//! passes through with timestamps rendered as ISO-8601 text. Lists stay lists
//! until export. Nothing here fails; a block that yields no fields is dropped.

use citius_record_models::{CaseRecord, FieldValue, ISO_TIMESTAMP_FORMAT, fields};

use crate::blocks::{TextBlocks, split_blocks};
use crate::patterns::{creditor_tax_ids, creditors, field_patterns};

/// Applies every field pattern and both creditor patterns to `block`.
#[must_use]
pub fn parse_block_fields(block: &str) -> CaseRecord {
    let mut record = CaseRecord::new();

    for pattern in field_patterns() {
        if let Some(value) = pattern.capture(block) {
            record.insert(pattern.name(), value);
        }
    }

    let names = creditors(block);
    if !names.is_empty() {
        record.insert(fields::CREDORES, names);
    }
    let tax_ids = creditor_tax_ids(block);
    if !tax_ids.is_empty() {
        record.insert(fields::NIFS_CREDORES, tax_ids);
    }

    record
}

/// Parses one block, or `None` when no pattern matched.
#[must_use]
pub fn normalize_block(block: &str) -> Option<CaseRecord> {
    let record = parse_block_fields(block);
    if record.is_empty() {
        log::debug!("Dropping block with no recognisable fields ({} chars)", block.len());
        None
    } else {
        Some(record)
    }
}

/// Splits `blob` into blocks and parses each one.
///
/// A blob with no case boundary becomes a single `Conteúdo` record, which is
/// then restructured like any keyed record, so labelled fields that are not
/// boundaries still come out as fields. An empty blob yields nothing.
#[must_use]
pub fn normalize_blob(blob: &str, cap: Option<u64>) -> Vec<CaseRecord> {
    match split_blocks(blob, cap) {
        TextBlocks::Opaque(text) if text.is_empty() => Vec::new(),
        TextBlocks::Opaque(text) => {
            vec![normalize_fields([(fields::CONTEUDO.to_owned(), FieldValue::Text(text))])]
        }
        TextBlocks::Cases(blocks) => blocks.iter().filter_map(|b| normalize_block(b)).collect(),
    }
}

/// Normalizes an already-keyed field set.
///
/// Timestamps become ISO-8601 text. A record holding nothing but
/// `Conteúdo` (and optionally `Links`) is re-parsed with the field patterns;
/// when that finds fields they replace the raw text and `Links` is kept.
/// Applying this to its own output changes nothing.
#[must_use]
pub fn normalize_fields(raw: impl IntoIterator<Item = (String, FieldValue)>) -> CaseRecord {
    let record: CaseRecord = raw
        .into_iter()
        .map(|(name, value)| (name, stringify_timestamp(value)))
        .collect();

    restructure_content(record)
}

/// [`normalize_fields`] for a record that is already a [`CaseRecord`].
#[must_use]
pub fn renormalize(record: CaseRecord) -> CaseRecord {
    normalize_fields(record)
}

fn stringify_timestamp(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Timestamp(ts) => FieldValue::Text(ts.format(ISO_TIMESTAMP_FORMAT).to_string()),
        other => other,
    }
}

fn restructure_content(mut record: CaseRecord) -> CaseRecord {
    let content_only = record
        .names()
        .all(|name| name == fields::CONTEUDO || name == fields::LINKS);
    if !content_only {
        return record;
    }
    let Some(content) = record.get(fields::CONTEUDO).and_then(FieldValue::as_text) else {
        return record;
    };

    let mut parsed = parse_block_fields(content);
    if parsed.is_empty() {
        return record;
    }
    if let Some(links) = record.remove(fields::LINKS) {
        parsed.insert(fields::LINKS, links);
    }
    parsed
}
