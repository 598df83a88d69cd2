//! Free page text strategy.
//!
//! Last real rung: only runs when the portal reported a positive total.
//! Dumps the raw page through the debug sink, then cuts the body text into
//! case blocks capped at the reported total.

use citius_record_models::{CaseRecord, fields};

use crate::dom::{DomError, Page};
use crate::normalize::normalize_blob;
use crate::strategy::{ExtractionOutcome, ExtractionStrategy, StrategyContext};

/// Note on the record emitted when the page text cannot be read.
pub const TEXT_FAILURE_NOTE: &str =
    "Falha na extração de resultados, mas foram encontrados documentos";

/// Parses the page body as free text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStrategy;

impl<P: Page> ExtractionStrategy<P> for TextStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn attempt(&self, page: &P, ctx: &StrategyContext<'_>) -> ExtractionOutcome {
        let Some(total) = ctx.total.filter(|&n| n > 0) else {
            log::debug!("Skipping page text extraction without a reported total");
            return ExtractionOutcome::NoMatch;
        };
        log::warn!("Results layout not recognised, extracting from page text");

        if let Some(sink) = ctx.debug_sink {
            match page.page_source() {
                Ok(markup) => {
                    if let Err(e) = sink.save_page(&markup) {
                        log::warn!("Could not save the results page: {e}");
                    }
                }
                Err(e) => log::warn!("Could not read the results page source: {e}"),
            }
        }

        match page.body_text() {
            Ok(text) => ExtractionOutcome::from_records(normalize_blob(&text, Some(total))),
            Err(e) => {
                log::error!("Could not read the page text: {e}");
                ExtractionOutcome::Matched(vec![failure_record(&e)])
            }
        }
    }
}

fn failure_record(error: &DomError) -> CaseRecord {
    CaseRecord::new()
        .with(fields::ERRO, error.to_string())
        .with(fields::OBSERVACAO, TEXT_FAILURE_NOTE)
}
