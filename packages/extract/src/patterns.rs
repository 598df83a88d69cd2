//! Field Pattern Library.
//!
//! One single-capture pattern per labelled field, in a fixed order, plus the
//! two repeating creditor patterns. A label pattern captures everything after
//! `"<Label>:"` up to the end of the line; leading whitespace (including a
//! line break right after the colon) is skipped.

use std::sync::LazyLock;

use citius_record_models::fields;
use regex::Regex;

/// Labelled fields read from free text, in extraction order.
pub const LABELS: [&str; 10] = [
    fields::TRIBUNAL,
    fields::ATO,
    fields::REFERENCIA,
    fields::PROCESSO,
    fields::ESPECIE,
    fields::DATA,
    fields::DATA_PROPOSITURA,
    fields::INSOLVENTE,
    fields::NIF_NIPC,
    fields::ADMINISTRADOR,
];

/// Labels that mark where one case ends and the next begins in free text.
/// `Administrador` has no colon so it also matches "Administrador Insolvência:".
pub const BOUNDARY_LABELS: [&str; 5] = [
    "Tribunal:",
    "Processo:",
    "Insolvente:",
    "Credor:",
    "Administrador",
];

/// A compiled `"<Label>:" <value>` pattern.
#[derive(Debug)]
pub struct FieldPattern {
    name: &'static str,
    regex: Regex,
}

impl FieldPattern {
    fn for_label(name: &'static str) -> Self {
        let regex = Regex::new(&format!(r"{}:\s*([^\n]*)", regex::escape(name)))
            .expect("valid regex");
        Self { name, regex }
    }

    /// Canonical field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Trimmed value of the first occurrence of the label in `text`.
    #[must_use]
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }
}

static FIELD_PATTERNS: LazyLock<Vec<FieldPattern>> =
    LazyLock::new(|| LABELS.into_iter().map(FieldPattern::for_label).collect());

static CREDITOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Credor:\s*([^\n]*)").expect("valid regex"));

/// The NIF/NIPC line directly below a `Credor:` line.
static CREDITOR_TAX_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Credor:[^\n]*\nNIF/NIPC:\s*([^\n]*)").expect("valid regex")
});

static BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = BOUNDARY_LABELS.iter().map(|l| regex::escape(l)).collect();
    Regex::new(&format!("(?:{})", alternatives.join("|"))).expect("valid regex")
});

/// The labelled field patterns, in [`LABELS`] order.
#[must_use]
pub fn field_patterns() -> &'static [FieldPattern] {
    &FIELD_PATTERNS
}

/// Case boundary matcher used by the block splitter.
#[must_use]
pub fn boundary_regex() -> &'static Regex {
    &BOUNDARY_RE
}

/// Every `Credor:` value in `text`, in order.
#[must_use]
pub fn creditors(text: &str) -> Vec<String> {
    capture_all(&CREDITOR_RE, text)
}

/// Every creditor NIF/NIPC in `text`, in order.
///
/// Only creditors followed by a `NIF/NIPC:` line contribute, so the result
/// lines up with [`creditors`] only when every creditor has one.
#[must_use]
pub fn creditor_tax_ids(text: &str) -> Vec<String> {
    capture_all(&CREDITOR_TAX_ID_RE, text)
}

fn capture_all(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .collect()
}
