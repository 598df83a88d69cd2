#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result-page extraction for the Citius insolvency publicity portal.
//!
//! The portal renders search results in more than one layout depending on
//! the query, so extraction is a ladder of strategies tried in order
//! ([`strategy::ResultExtractor`]): the results table ([`table`]), the
//! results div list ([`list`]), and free page text ([`text`]), with
//! placeholder records as the last rung. Each rung reads the page through the
//! [`dom::Page`] abstraction, so the same code runs against a live browser
//! session or a saved HTML snapshot ([`html::HtmlPage`]).
//!
//! Free text is cut into per-case blocks by [`blocks`] and turned into
//! fields by [`normalize`] using the label patterns in [`patterns`].

pub mod blocks;
pub mod dom;
#[cfg(test)]
mod fake;
pub mod html;
pub mod list;
pub mod normalize;
pub mod patterns;
pub mod progress;
pub mod sink;
pub mod strategy;
pub mod table;
pub mod text;
pub mod total;

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub use dom::{DomError, Element, Locator, Page};
pub use strategy::{Extraction, ExtractionOutcome, ExtractionStrategy, Origin, ResultExtractor};

/// Element ids, selectors and limits used while reading the results page.
///
/// Deserialized from the `[extraction]` table of the portal config; every
/// field falls back to the value in [`ExtractConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Text that follows the result count ("N documentos encontrados").
    pub total_marker: String,
    /// Id of the results `<table>`.
    pub results_table_id: String,
    /// Id of the results container `<div>`.
    pub results_container_id: String,
    /// Page-wide selector for result items, tried first.
    pub item_selector: String,
    /// Page-wide selector tried when [`Self::item_selector`] finds nothing.
    pub item_fallback_selector: String,
    /// Selector scoped to the results container, tried last.
    pub nested_item_selector: String,
    /// Soft wall-clock budget for the row/item loops, in seconds.
    pub budget_secs: u64,
    /// Where the raw results page is dumped when free-text extraction runs.
    pub debug_page: PathBuf,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            total_marker: "documentos encontrados".to_owned(),
            results_table_id: "ctl00_ContentPlaceHolder1_gvResults".to_owned(),
            results_container_id: "ctl00_ContentPlaceHolder1_divResultados".to_owned(),
            item_selector: "div[class*='resultadocdital'], div[class*='resultado']".to_owned(),
            item_fallback_selector: ".resultadocdital, .resultado, \
                 div[id*='divResultado']:not(#ctl00_ContentPlaceHolder1_divResultados)"
                .to_owned(),
            nested_item_selector: "div[id*='divResultado']".to_owned(),
            budget_secs: 800,
            debug_page: PathBuf::from("debug_results_page.html"),
        }
    }
}

impl ExtractConfig {
    /// The soft extraction budget.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }

    /// Sets the soft extraction budget.
    #[must_use]
    pub const fn with_budget_secs(mut self, secs: u64) -> Self {
        self.budget_secs = secs;
        self
    }

    /// Sets where the raw page is dumped by the free-text rung.
    #[must_use]
    pub fn with_debug_page(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_page = path.into();
        self
    }
}
