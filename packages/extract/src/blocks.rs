//! Text-Block Extractor.
//!
//! Cuts a free-text blob into one block per case. The blob is split on the
//! [`BOUNDARY_LABELS`](crate::patterns::BOUNDARY_LABELS); the text before the
//! first boundary is page chrome and is dropped.
//!
//! Cases open at `Tribunal:`, the label every case on the portal starts
//! with. A blob without it falls back to its first boundary label. Fragments
//! after any other boundary are continuations of the current block with their
//! label put back, and boundaries before the first opening one belong to the
//! page chrome. A block that opens a case gets its leading label from
//! [`reattach_label`], a best-effort guess that can misattribute the label
//! when sections are nested or reordered.

use crate::patterns::boundary_regex;

/// The blob cut into case blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBlocks {
    /// No boundary label matched. Holds the trimmed blob.
    Opaque(String),
    /// One trimmed block per case, in page order.
    Cases(Vec<String>),
}

/// Label that opens a case when the blob has one.
const CASE_LABEL: &str = "Tribunal:";

/// Splits `blob` into case blocks, keeping at most `cap` of them.
#[must_use]
pub fn split_blocks(blob: &str, cap: Option<u64>) -> TextBlocks {
    let boundaries: Vec<_> = boundary_regex().find_iter(blob).collect();
    let Some(first) = boundaries.first() else {
        return TextBlocks::Opaque(blob.trim().to_owned());
    };
    let opener = boundaries
        .iter()
        .find(|b| b.as_str() == CASE_LABEL)
        .map_or_else(|| first.as_str(), regex::Match::as_str);
    let limit = cap.map_or(usize::MAX, |c| usize::try_from(c).unwrap_or(usize::MAX));

    let mut cases: Vec<String> = Vec::new();
    for (i, boundary) in boundaries.iter().enumerate() {
        let end = boundaries.get(i + 1).map_or(blob.len(), regex::Match::start);
        let body = &blob[boundary.end()..end];

        if boundary.as_str() == opener {
            if cases.len() >= limit {
                log::debug!("Block cap of {limit} reached, ignoring the rest of the text");
                break;
            }
            let mut block = reattach_label(cases.len(), body, blob).to_owned();
            block.push_str(body);
            cases.push(block);
        } else if let Some(current) = cases.last_mut() {
            current.push_str(boundary.as_str());
            current.push_str(body);
        } else {
            log::debug!("Skipping '{}' before the first case", boundary.as_str());
        }
    }

    TextBlocks::Cases(cases.into_iter().map(|c| c.trim().to_owned()).collect())
}

/// Picks the label to put back in front of the body of case number `index`.
///
/// Precedence: the first block, or a body not starting with `:`, gets
/// `Tribunal`; otherwise the first of `Insolvente`, `Credor` and
/// `Administrador` found anywhere in `blob`, else `Processo`.
#[must_use]
pub fn reattach_label(index: usize, body: &str, blob: &str) -> &'static str {
    if index == 0 || !body.trim_start().starts_with(':') {
        "Tribunal: "
    } else if blob.contains("Insolvente") {
        "Insolvente: "
    } else if blob.contains("Credor") {
        "Credor: "
    } else if blob.contains("Administrador") {
        "Administrador: "
    } else {
        "Processo: "
    }
}
