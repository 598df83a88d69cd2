//! Reported result count ("N documentos encontrados").

use std::sync::LazyLock;

use regex::Regex;

use crate::dom::Page;

static FIRST_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Reads the result count the portal prints above the results.
///
/// Returns `None` when the page has no count or its body cannot be read.
pub fn reported_total<P: Page>(page: &P, marker: &str) -> Option<u64> {
    match page.body_text() {
        Ok(text) => parse_reported_total(&text, marker),
        Err(e) => {
            log::warn!("Could not read page text for the result count: {e}");
            None
        }
    }
}

/// Parses the count out of rendered page text.
///
/// Prefers the integer directly before `marker`; otherwise takes the first
/// integer on the first line that mentions `marker`.
#[must_use]
pub fn parse_reported_total(text: &str, marker: &str) -> Option<u64> {
    if marker.is_empty() {
        return None;
    }

    let adjacent = Regex::new(&format!(r"(\d+)\s+{}", regex::escape(marker))).ok()?;
    if let Some(count) = adjacent.captures(text).and_then(|caps| caps.get(1)) {
        return count.as_str().parse().ok();
    }

    let line = text.lines().find(|line| line.contains(marker))?;
    FIRST_INTEGER_RE.find(line)?.as_str().parse().ok()
}
