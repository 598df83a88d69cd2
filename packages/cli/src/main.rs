#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the Citius insolvency search scraper.
//!
//! Uses `indicatif-log-bridge` (via [`citius_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod manual;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use citius_cli_utils::{IndicatifProgress, MultiProgress};
use citius_extract::progress::null_progress;
use citius_record_models::{CourtSet, CriteriaError, CriteriaInput, DaysFilter, SearchCriteria};
use citius_session::chrome::ChromeSession;
use citius_session::{BrowserSession, PortalConfig, SubmitOutcome};
use clap::{CommandFactory, Parser};

use crate::pipeline::{Progress, RunError, RunSummary};

#[derive(Parser)]
#[command(name = "citius", about = "Insolvency publicity search scraper for the Citius portal")]
struct Cli {
    /// NIF/NIPC to search for
    #[arg(long)]
    nif: Option<String>,
    /// Entity name to search for
    #[arg(long)]
    designacao: Option<String>,
    /// First publication date (DD-MM-YYYY)
    #[arg(long)]
    data_inicio: Option<String>,
    /// Last publication date (DD-MM-YYYY)
    #[arg(long)]
    data_fim: Option<String>,
    /// Court set: "nova" or "extintos"
    #[arg(long, value_name = "nova|extintos")]
    tribunal: Option<CourtSet>,
    /// Act group, by its label in the form
    #[arg(long)]
    grupo_actos: Option<String>,
    /// Specific act, by its label in the form
    #[arg(long)]
    acto: Option<String>,
    /// Publication window: 15, 30 or todos
    #[arg(long, default_value = "todos", value_name = "15|30|todos")]
    dias: DaysFilter,
    /// Output file name without extension
    #[arg(long, default_value = "resultados_citius")]
    output: PathBuf,
    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,
    /// Verbose logging
    #[arg(long)]
    debug: bool,
    /// Wait limit for page loads and elements, in seconds (default: 60)
    #[arg(long)]
    timeout: Option<u64>,
    /// Portal configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Re-extract a saved results page instead of searching
    #[arg(long, value_name = "FILE")]
    from_html: Option<PathBuf>,
    /// Show the full manual and exit
    #[arg(long)]
    man: bool,
}

/// What to run.
enum Mode {
    Search(SearchCriteria),
    Offline(PathBuf),
}

impl Cli {
    fn criteria(&self) -> CriteriaInput {
        CriteriaInput {
            tax_id: self.nif.clone(),
            entity_name: self.designacao.clone(),
            start_date: self.data_inicio.clone(),
            end_date: self.data_fim.clone(),
            court: self.tribunal,
            act_group: self.grupo_actos.clone(),
            act: self.acto.clone(),
            days: self.dias,
        }
    }

    fn mode(&self) -> Result<Mode, CriteriaError> {
        match &self.from_html {
            Some(page) => Ok(Mode::Offline(page.clone())),
            None => self.criteria().validate().map(Mode::Search),
        }
    }

    fn portal_config(&self) -> Result<PortalConfig, RunError> {
        let mut config = PortalConfig::load(self.config.as_deref())?;
        if self.headless {
            config = config.with_headless(true);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout_secs(secs);
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.man {
        println!("{}", manual::MANUAL);
        return ExitCode::SUCCESS;
    }

    let multi = citius_cli_utils::init_logger(cli.debug);

    let mode = match cli.mode() {
        Ok(mode) => mode,
        Err(e) => {
            log::error!("{e}");
            Cli::command().print_help().ok();
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, mode, &multi) {
        Ok(summary) => {
            if let Some(SubmitOutcome::NoResults(message)) = &summary.outcome {
                log::info!("Portal message: {message}");
            }
            let count = summary.record_count();
            if count == 0 {
                log::info!("No results found");
            } else {
                log::info!("Total results extracted: {count}");
            }
            log::info!(
                "Results saved to {} and {}",
                summary.report.paths.csv.display(),
                summary.report.paths.json.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Error during execution: {e}");
            match pipeline::write_fault_report(&e.to_string(), &cli.output) {
                Ok(report) => log::info!(
                    "Error details saved to {} and {}",
                    report.paths.csv.display(),
                    report.paths.json.display()
                ),
                Err(write_err) => log::error!("Could not save error details: {write_err}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, mode: Mode, multi: &MultiProgress) -> Result<RunSummary, RunError> {
    let config = cli.portal_config()?;
    let records = IndicatifProgress::records_bar(multi, "Reading results");

    match mode {
        Mode::Offline(page) => pipeline::run_offline(
            &page,
            &config,
            &cli.output,
            &Progress::new(null_progress(), records),
        ),
        Mode::Search(criteria) => {
            let steps = IndicatifProgress::steps_bar(multi, "Searching", pipeline::STEPS);
            let mut session = ChromeSession::launch(&config)?;
            let result = pipeline::run_search(
                &mut session,
                &config,
                &criteria,
                &cli.output,
                &Progress::new(steps, records),
            );
            session.close();
            result.map_err(RunError::from)
        }
    }
}
