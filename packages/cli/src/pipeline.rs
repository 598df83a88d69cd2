//! Search pipeline: form, extraction, export.
//!
//! A run always leaves a `<base>.csv`/`<base>.json` pair behind. Form
//! failures (page down, search box missing, portal validation) write the
//! empty pair and still count as a completed run; only export failures
//! propagate. The binary turns anything that escapes into a fault report
//! with [`write_fault_report`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use citius_export::{ExportError, ExportReport, save_results};
use citius_extract::html::HtmlPage;
use citius_extract::normalize::normalize_fields;
use citius_extract::progress::{ProgressCallback, null_progress};
use citius_extract::sink::FileDebugSink;
use citius_extract::{Extraction, ResultExtractor};
use citius_record_models::{CaseRecord, FieldValue, SearchCriteria, fields};
use citius_session::form::{fill_search_form, open_search_page, submit_search};
use citius_session::{BrowserSession, ConfigError, PortalConfig, SessionError, SubmitOutcome};

/// `Observação` of the fault report.
pub const FAULT_NOTE: &str = "Erro durante execução do script";

/// Stages reported on the steps bar: open, fill, submit, extract, export.
pub const STEPS: u64 = 5;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The portal config could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The browser could not be started.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The output files could not be written.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// A saved results page could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    ReadPage {
        /// Requested file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Progress indicators for a run.
pub struct Progress {
    steps: Arc<dyn ProgressCallback>,
    records: Arc<dyn ProgressCallback>,
}

impl Progress {
    /// Stage-level and row-level indicators.
    #[must_use]
    pub fn new(steps: Arc<dyn ProgressCallback>, records: Arc<dyn ProgressCallback>) -> Self {
        Self { steps, records }
    }

    /// No indicators.
    #[cfg(test)]
    #[must_use]
    pub fn silent() -> Self {
        Self::new(null_progress(), null_progress())
    }

    fn stage(&self, message: &str) {
        self.steps.set_message(message.to_owned());
    }

    fn stage_done(&self) {
        self.steps.inc(1);
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// How the portal answered the search. `None` when the form could not
    /// be driven, and for offline runs.
    pub outcome: Option<SubmitOutcome>,
    /// Extraction result. `None` when the form could not be driven.
    pub extraction: Option<Extraction>,
    /// The files written.
    pub report: ExportReport,
}

impl RunSummary {
    /// Number of records written.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.extraction.as_ref().map_or(0, |e| e.records.len())
    }
}

/// Runs a search on `session` and writes the results to `output`.
///
/// # Errors
///
/// Returns [`ExportError`] if the output files cannot be written.
pub fn run_search<S: BrowserSession>(
    session: &mut S,
    config: &PortalConfig,
    criteria: &SearchCriteria,
    output: &Path,
    progress: &Progress,
) -> Result<RunSummary, ExportError> {
    let outcome = match drive_form(session, config, criteria, progress) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Search could not be completed: {e}");
            progress.steps.finish_and_clear();
            let report = save_results(&[], output)?;
            return Ok(RunSummary {
                outcome: None,
                extraction: None,
                report,
            });
        }
    };

    progress.stage("Extracting results");
    let extraction = ResultExtractor::new(config.extraction.clone())
        .with_progress(Arc::clone(&progress.records))
        .with_debug_sink(FileDebugSink::new(config.extraction.debug_page.clone()))
        .extract(session);
    progress.records.finish_and_clear();
    progress.stage_done();

    progress.stage("Saving results");
    let report = save_results(&extraction.records, output)?;
    progress.stage_done();
    progress.steps.finish(format!("{} results", extraction.records.len()));

    Ok(RunSummary {
        outcome: Some(outcome),
        extraction: Some(extraction),
        report,
    })
}

fn drive_form<S: BrowserSession>(
    session: &mut S,
    config: &PortalConfig,
    criteria: &SearchCriteria,
    progress: &Progress,
) -> Result<SubmitOutcome, SessionError> {
    progress.stage("Opening search page");
    open_search_page(session, config)?;
    progress.stage_done();

    progress.stage("Filling search form");
    fill_search_form(session, config, criteria)?;
    progress.stage_done();

    progress.stage("Submitting search");
    let outcome = submit_search(session, config)?;
    progress.stage_done();

    Ok(outcome)
}

/// Re-extracts a saved results page and writes the results to `output`.
///
/// Relative links resolve against the configured search address, as they
/// would in the browser.
///
/// # Errors
///
/// * [`RunError::ReadPage`] if `page` cannot be read
/// * [`RunError::Export`] if the output files cannot be written
pub fn run_offline(
    page: &Path,
    config: &PortalConfig,
    output: &Path,
    progress: &Progress,
) -> Result<RunSummary, RunError> {
    log::info!("Re-extracting saved page {}", page.display());
    let source = std::fs::read_to_string(page).map_err(|source| RunError::ReadPage {
        path: page.to_path_buf(),
        source,
    })?;

    let snapshot = HtmlPage::parse(source.as_str())
        .with_base_url(&config.search_url)
        .unwrap_or_else(|e| {
            log::warn!("Ignoring invalid base URL '{}': {e}", config.search_url);
            HtmlPage::parse(source)
        });

    let extraction = ResultExtractor::new(config.extraction.clone())
        .with_progress(Arc::clone(&progress.records))
        .extract(&snapshot);
    progress.records.finish_and_clear();

    let report = save_results(&extraction.records, output)?;
    Ok(RunSummary {
        outcome: None,
        extraction: Some(extraction),
        report,
    })
}

/// The single record of a fault report.
#[must_use]
pub fn fault_record(error: &str, at: NaiveDateTime) -> CaseRecord {
    normalize_fields([
        (fields::DATA_EXTRACAO.to_owned(), FieldValue::Timestamp(at)),
        (fields::ERRO.to_owned(), FieldValue::from(error)),
        (fields::OBSERVACAO.to_owned(), FieldValue::from(FAULT_NOTE)),
    ])
}

/// Writes the fault report pair for `error`, stamped with the local time.
///
/// # Errors
///
/// Returns [`ExportError`] if the files cannot be written.
pub fn write_fault_report(error: &str, output: &Path) -> Result<ExportReport, ExportError> {
    let record = fault_record(error, Local::now().naive_local());
    save_results(std::slice::from_ref(&record), output)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use chrono::NaiveDate;
    use citius_export::NO_RESULTS_NOTE;
    use citius_extract::{DomError, Locator, Origin, Page};
    use citius_record_models::CriteriaInput;
    use serde_json::json;

    use super::*;

    const BUTTON: &str = "ctl00_ContentPlaceHolder1_btnSearch";

    const FORM: &str = "<body><form>\
        <input id='ctl00_ContentPlaceHolder1_txtPesquisa'>\
        <input type='radio' id='ctl00_ContentPlaceHolder1_rblTipo_0'>\
        <input type='radio' id='ctl00_ContentPlaceHolder1_rblDias_2'>\
        <input type='submit' id='ctl00_ContentPlaceHolder1_btnSearch'>\
        </form></body>";

    const RESULTS: &str = "<body><p>2 documentos encontrados</p>\
        <table id='ctl00_ContentPlaceHolder1_gvResults'>\
        <tr><th>Tribunal</th><th>Processo</th><th>Data</th><th>Ato</th><th>Descrição</th></tr>\
        <tr><td>Lisboa</td><td>1/24</td><td>02-01-2025</td><td>Sentença</td>\
            <td><a href='Doc.aspx?id=1'>ver</a></td></tr>\
        <tr><td>Porto</td><td>2/24</td><td>03-01-2025</td><td>Citação</td>\
            <td><a href='Doc.aspx?id=2'>ver</a></td></tr>\
        </table></body>";

    /// Serves `form` until the search button is clicked, then `results`.
    struct ScriptedSession {
        form: HtmlPage,
        results: HtmlPage,
        submitted: Cell<bool>,
        reachable: bool,
    }

    impl ScriptedSession {
        fn new(results: &str) -> Self {
            Self {
                form: HtmlPage::parse(FORM),
                results: HtmlPage::parse(results),
                submitted: Cell::new(false),
                reachable: true,
            }
        }

        fn current(&self) -> &HtmlPage {
            if self.submitted.get() { &self.results } else { &self.form }
        }

        fn require(&self, locator: &Locator) -> Result<(), SessionError> {
            self.find_first(locator)
                .map(|_| ())
                .ok_or_else(|| SessionError::MissingElement(locator.to_string()))
        }
    }

    impl Page for ScriptedSession {
        type Element<'a> = citius_extract::html::HtmlElement<'a>;

        fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element<'_>>, DomError> {
            self.current().find_all(locator)
        }

        fn page_source(&self) -> Result<String, DomError> {
            self.current().page_source()
        }

        fn body_text(&self) -> Result<String, DomError> {
            self.current().body_text()
        }
    }

    impl BrowserSession for ScriptedSession {
        fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
            if self.reachable {
                Ok(())
            } else {
                Err(SessionError::Navigation {
                    url: url.to_owned(),
                    message: "unreachable".to_owned(),
                })
            }
        }

        fn wait_for(&self, locator: &Locator, _timeout: Duration) -> bool {
            self.find_first(locator).is_some()
        }

        fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> bool {
            self.wait_for(locator, timeout)
        }

        fn click(&self, locator: &Locator) -> Result<(), SessionError> {
            self.require(locator)?;
            if *locator == Locator::id(BUTTON) {
                self.submitted.set(true);
            }
            Ok(())
        }

        fn fill(&self, locator: &Locator, _text: &str) -> Result<(), SessionError> {
            self.require(locator)
        }

        fn select_by_text(&self, locator: &Locator, _text: &str) -> Result<(), SessionError> {
            self.require(locator)
        }

        fn pause(&self, _duration: Duration) {}

        fn close(&mut self) {}
    }

    fn out_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("citius_cli_{name}"));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    fn config(dir: &Path) -> PortalConfig {
        let mut config = PortalConfig::default();
        config.extraction = config.extraction.with_debug_page(dir.join("debug.html"));
        config
    }

    fn criteria() -> SearchCriteria {
        CriteriaInput {
            tax_id: Some("503504564".to_owned()),
            ..CriteriaInput::default()
        }
        .validate()
        .unwrap()
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn search_extracts_table_and_writes_both_files() {
        let dir = out_dir("search_table");
        let mut session = ScriptedSession::new(RESULTS);
        let summary = run_search(
            &mut session,
            &config(&dir),
            &criteria(),
            &dir.join("resultados.csv"),
            &Progress::silent(),
        )
        .unwrap();

        assert_eq!(summary.outcome, Some(SubmitOutcome::ResultsListed));
        let extraction = summary.extraction.as_ref().unwrap();
        assert_eq!(extraction.total, Some(2));
        assert_eq!(extraction.origin, Origin::Strategy("table"));
        assert_eq!(summary.record_count(), 2);

        let csv = std::fs::read_to_string(&summary.report.paths.csv).unwrap();
        assert!(csv.starts_with("Ato,Data,Descrição,Processo,Tribunal,Links\n"));
        assert!(csv.contains("Sentença,02-01-2025,ver,1/24,Lisboa,Doc.aspx?id=1\n"));

        let json = read_json(&summary.report.paths.json);
        assert_eq!(json[1]["Tribunal"], "Porto");
        assert_eq!(json[1]["Links"], json!(["Doc.aspx?id=2"]));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unreachable_portal_still_writes_empty_pair() {
        let dir = out_dir("unreachable");
        let mut session = ScriptedSession::new(RESULTS);
        session.reachable = false;
        let summary = run_search(
            &mut session,
            &config(&dir),
            &criteria(),
            &dir.join("out"),
            &Progress::silent(),
        )
        .unwrap();

        assert!(summary.outcome.is_none());
        assert_eq!(summary.record_count(), 0);
        assert_eq!(
            read_json(&dir.join("out.json")),
            json!({ "Observação": NO_RESULTS_NOTE })
        );
        assert_eq!(
            std::fs::read_to_string(dir.join("out.csv")).unwrap(),
            format!("Observação\n{NO_RESULTS_NOTE}\n")
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejected_form_writes_empty_pair() {
        let dir = out_dir("rejected");
        let mut session =
            ScriptedSession::new("<body><span style='color:Red;'>Data inválida</span></body>");
        let summary = run_search(
            &mut session,
            &config(&dir),
            &criteria(),
            &dir.join("out"),
            &Progress::silent(),
        )
        .unwrap();

        assert!(summary.outcome.is_none());
        assert!(summary.extraction.is_none());
        assert_eq!(
            read_json(&dir.join("out.json")),
            json!({ "Observação": NO_RESULTS_NOTE })
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn offline_run_reads_saved_text_page() {
        let dir = out_dir("offline");
        std::fs::create_dir_all(&dir).unwrap();
        let saved = dir.join("debug_results_page.html");
        std::fs::write(
            &saved,
            "<html><body><div>1 documentos encontrados</div>\
             <div>Tribunal: Comarca de Faro</div><div>Processo: 7/25</div>\
             <div>Credor: Banco A</div></body></html>",
        )
        .unwrap();

        let summary = run_offline(&saved, &config(&dir), &dir.join("out"), &Progress::silent())
            .unwrap();
        let extraction = summary.extraction.as_ref().unwrap();
        assert_eq!(extraction.origin, Origin::Strategy("text"));

        let json = read_json(&dir.join("out.json"));
        assert_eq!(json[0]["Tribunal"], "Comarca de Faro");
        assert_eq!(json[0]["Processo"], "7/25");
        assert_eq!(json[0]["Credores"], json!(["Banco A"]));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn offline_run_reports_missing_page() {
        let dir = out_dir("offline_missing");
        assert!(matches!(
            run_offline(
                &dir.join("nope.html"),
                &PortalConfig::default(),
                &dir.join("out"),
                &Progress::silent()
            ),
            Err(RunError::ReadPage { .. })
        ));
    }

    #[test]
    fn fault_record_has_iso_timestamp() {
        let at = NaiveDate::from_ymd_opt(2025, 1, 2)
            .and_then(|d| d.and_hms_opt(10, 30, 0))
            .unwrap();
        let record = fault_record("chrome not found", at);
        assert_eq!(
            record.names().collect::<Vec<_>>(),
            vec![fields::DATA_EXTRACAO, fields::ERRO, fields::OBSERVACAO]
        );
        assert_eq!(
            record.get(fields::DATA_EXTRACAO),
            Some(&FieldValue::from("2025-01-02T10:30:00"))
        );
    }

    #[test]
    fn fault_report_writes_pair() {
        let dir = out_dir("fault");
        let report = write_fault_report("boom", &dir.join("out.csv")).unwrap();

        let json = read_json(&report.paths.json);
        assert_eq!(json[0]["Erro"], "boom");
        assert_eq!(json[0]["Observação"], FAULT_NOTE);
        let csv = std::fs::read_to_string(&report.paths.csv).unwrap();
        assert!(csv.starts_with("Data_Extracao,Erro,Observação\n"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
