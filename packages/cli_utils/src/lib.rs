#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the `citius` binary.
//!
//! Two bars track a search: the stage bar counts the portal steps and the
//! results bar counts rows or items as the extraction ladder reads them.
//! Log lines go through [`init_logger`], which suspends the bars while a line
//! is printed.

use std::sync::Arc;
use std::time::Duration;

use citius_extract::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

pub use indicatif::MultiProgress;

const RESULTS_TEMPLATE: &str = "  {msg} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]";
const STAGES_TEMPLATE: &str = "{msg} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]";

/// Extraction and search progress drawn with `indicatif`.
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Style applied by [`ProgressCallback::set_total`].
    counted_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Bar for the results page.
    ///
    /// The number of rows is unknown until a strategy finds the table or list,
    /// so this spins until the strategy reports a total.
    #[must_use]
    pub fn records_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_owned());

        Arc::new(Self {
            bar,
            counted_style: counted_style(RESULTS_TEMPLATE),
        })
    }

    /// Bar for the `total` stages of a portal search.
    #[must_use]
    pub fn steps_bar(
        multi: &MultiProgress,
        message: &str,
        total: u64,
    ) -> Arc<dyn ProgressCallback> {
        let bar = multi.add(ProgressBar::new(total));
        let counted_style = counted_style(STAGES_TEMPLATE);
        bar.set_style(counted_style.clone());
        bar.set_message(message.to_owned());

        Arc::new(Self { bar, counted_style })
    }
}

fn counted_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.counted_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Installs the global logger and returns the [`MultiProgress`] every bar
/// of the run must be added to.
///
/// Level is `info` unless `RUST_LOG` says otherwise. `--debug` raises it to
/// `debug` on top of `RUST_LOG`.
#[must_use]
pub fn init_logger(debug: bool) -> MultiProgress {
    let multi = MultiProgress::new();

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(LevelFilter::Info);
    builder.parse_env("RUST_LOG");
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let logger = builder.build();
    let level = logger.filter();

    // A second call keeps the first logger.
    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_ok()
    {
        log::set_max_level(level);
    }
    log::debug!("Debug logging enabled");

    multi
}
