//! Result Extraction Strategy Selector.
//!
//! [`ResultExtractor`] reads the reported total, then tries each
//! [`ExtractionStrategy`] in order and keeps the first non-empty outcome.
//! A reported total of zero ends extraction before any strategy runs. When
//! every strategy comes back empty but the portal reported documents,
//! placeholder records stand in for them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use citius_record_models::{CaseRecord, fields};

use crate::ExtractConfig;
use crate::dom::Page;
use crate::list::ListStrategy;
use crate::progress::{NullProgress, ProgressCallback, null_progress};
use crate::sink::DebugSink;
use crate::table::TableStrategy;
use crate::text::TextStrategy;
use crate::total::reported_total;

/// Note carried by every placeholder record.
pub const PLACEHOLDER_NOTE: &str = "Documento detectado mas não foi possível extrair detalhes";

/// What one strategy attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// At least one record.
    Matched(Vec<CaseRecord>),
    /// The strategy did not recognise the page, or found nothing in it.
    NoMatch,
}

impl ExtractionOutcome {
    /// [`Self::Matched`] unless `records` is empty.
    #[must_use]
    pub fn from_records(records: Vec<CaseRecord>) -> Self {
        if records.is_empty() {
            Self::NoMatch
        } else {
            Self::Matched(records)
        }
    }

    /// Returns `true` for [`Self::Matched`].
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// The records, empty for [`Self::NoMatch`].
    #[must_use]
    pub fn into_records(self) -> Vec<CaseRecord> {
        match self {
            Self::Matched(records) => records,
            Self::NoMatch => Vec::new(),
        }
    }
}

/// Soft wall-clock limit shared by every row and item loop of one
/// extraction. Loops check it once per iteration and keep what they have
/// when it expires.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    /// `None` when the budget is too large to represent.
    expires_at: Option<Instant>,
}

impl Deadline {
    /// A deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(budget),
        }
    }

    /// Returns `true` once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Inputs shared by the strategies of one extraction.
pub struct StrategyContext<'a> {
    /// Reported total, `None` when the page did not state one.
    pub total: Option<u64>,
    /// Shared loop deadline.
    pub deadline: Deadline,
    /// Selectors and limits.
    pub config: &'a ExtractConfig,
    /// Per-row/item progress.
    pub progress: &'a dyn ProgressCallback,
    /// Receives the raw page when free-text extraction runs.
    pub debug_sink: Option<&'a dyn DebugSink>,
}

impl<'a> StrategyContext<'a> {
    /// Context with a fresh deadline from `config`, silent progress and no
    /// debug sink.
    #[must_use]
    pub fn new(config: &'a ExtractConfig, total: Option<u64>) -> Self {
        Self {
            total,
            deadline: Deadline::after(config.budget()),
            config,
            progress: &NullProgress,
            debug_sink: None,
        }
    }

    /// Reports loop progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Sends the raw page to `sink` when free-text extraction runs.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: Option<&'a dyn DebugSink>) -> Self {
        self.debug_sink = sink;
        self
    }
}

/// One way of reading records off a results page.
///
/// Implementations never fail: errors on a single row or item are logged and
/// skipped, and anything that prevents the strategy from recognising the page
/// is reported as [`ExtractionOutcome::NoMatch`].
pub trait ExtractionStrategy<P: Page> {
    /// Short name used in logs and [`Origin::Strategy`].
    fn name(&self) -> &'static str;

    /// Reads records from `page`.
    fn attempt(&self, page: &P, ctx: &StrategyContext<'_>) -> ExtractionOutcome;
}

/// Which rung of the ladder produced the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The portal reported zero documents; no strategy ran.
    ReportedEmpty,
    /// The named strategy matched.
    Strategy(&'static str),
    /// Every strategy came back empty; the records are placeholders.
    Placeholder,
    /// Every strategy came back empty and there was no positive total to
    /// size placeholders from.
    Unmatched,
}

/// Final result of [`ResultExtractor::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Reported total.
    pub total: Option<u64>,
    /// Where the records came from.
    pub origin: Origin,
    /// Normalized records, possibly empty.
    pub records: Vec<CaseRecord>,
}

/// Runs the strategy ladder against a page.
pub struct ResultExtractor<P: Page> {
    config: ExtractConfig,
    strategies: Vec<Box<dyn ExtractionStrategy<P>>>,
    progress: Arc<dyn ProgressCallback>,
    debug_sink: Option<Box<dyn DebugSink>>,
}

impl<P: Page> ResultExtractor<P> {
    /// Extractor with the standard ladder: table, list, then free text.
    #[must_use]
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            config,
            strategies: vec![
                Box::new(TableStrategy),
                Box::new(ListStrategy),
                Box::new(TextStrategy),
            ],
            progress: null_progress(),
            debug_sink: None,
        }
    }

    /// Replaces the ladder.
    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ExtractionStrategy<P>>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Reports loop progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Sends the raw page to `sink` when free-text extraction runs.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: impl DebugSink + 'static) -> Self {
        self.debug_sink = Some(Box::new(sink));
        self
    }

    /// Reads the reported total from `page`, then extracts.
    pub fn extract(&self, page: &P) -> Extraction {
        let total = reported_total(page, &self.config.total_marker);
        self.extract_with_total(page, total)
    }

    /// Extracts with an already known total.
    pub fn extract_with_total(&self, page: &P, total: Option<u64>) -> Extraction {
        match total {
            Some(0) => {
                log::info!("Portal reported no documents");
                return Extraction {
                    total,
                    origin: Origin::ReportedEmpty,
                    records: Vec::new(),
                };
            }
            Some(n) => log::info!("Portal reported {n} documents"),
            None => log::warn!("Result count not found on the page"),
        }

        let ctx = StrategyContext::new(&self.config, total)
            .with_progress(self.progress.as_ref())
            .with_debug_sink(self.debug_sink.as_deref());

        for strategy in &self.strategies {
            log::debug!("Trying {} extraction", strategy.name());
            match strategy.attempt(page, &ctx) {
                ExtractionOutcome::Matched(records) => {
                    log::info!(
                        "Extracted {} records using {} extraction",
                        records.len(),
                        strategy.name()
                    );
                    return Extraction {
                        total,
                        origin: Origin::Strategy(strategy.name()),
                        records,
                    };
                }
                ExtractionOutcome::NoMatch => {
                    log::debug!("{} extraction found nothing", strategy.name());
                }
            }
        }

        match total {
            Some(n) if n > 0 => {
                log::warn!("No records could be extracted; emitting {n} placeholder records");
                Extraction {
                    total,
                    origin: Origin::Placeholder,
                    records: placeholders(n),
                }
            }
            _ => {
                log::warn!("No records could be extracted");
                Extraction {
                    total,
                    origin: Origin::Unmatched,
                    records: Vec::new(),
                }
            }
        }
    }
}

/// `total` stand-in records numbered from 1.
#[must_use]
pub fn placeholders(total: u64) -> Vec<CaseRecord> {
    (1..=total)
        .map(|index| {
            CaseRecord::new()
                .with(fields::INDICE, index)
                .with(fields::TOTAL_DOCUMENTOS, total)
                .with(fields::OBSERVACAO, PLACEHOLDER_NOTE)
        })
        .collect()
}
