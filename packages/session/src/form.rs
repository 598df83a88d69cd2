//! Search form driver.
//!
//! Opens the insolvency search page, fills it from [`SearchCriteria`] and
//! submits it. Only the search box is mandatory; every other control is
//! best-effort and a missing one is logged and skipped, since the portal
//! hides some filters depending on earlier choices.

use std::time::Duration;

use citius_extract::{Element, Locator, Page};
use citius_record_models::criteria::{SearchCriteria, SearchSubject};

use crate::config::PortalConfig;
use crate::{BrowserSession, SessionError};

/// What the page showed after the search was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The result count marker is on the page.
    ResultsListed,
    /// The portal reported no matches, with its message.
    NoResults(String),
    /// None of the known result, empty or error markers were found.
    Unrecognized,
}

/// Loads the search page and waits for the search box.
///
/// # Errors
///
/// * [`SessionError::Navigation`] if the page does not load
/// * [`SessionError::MissingElement`] if the search box never appears
pub fn open_search_page<S: BrowserSession>(
    session: &mut S,
    config: &PortalConfig,
) -> Result<(), SessionError> {
    log::info!("Opening search page {}", config.search_url);
    session.navigate(&config.search_url)?;

    let input = Locator::id(&config.form.search_input);
    if !session.wait_for(&input, config.timeout()) {
        log::error!("Search page did not load: {input} missing");
        return Err(SessionError::MissingElement(input.to_string()));
    }

    log::info!("Search page loaded");
    Ok(())
}

/// Fills the search form from `criteria`.
///
/// # Errors
///
/// * [`SessionError::MissingElement`] if the search box is absent
/// * [`SessionError::Browser`] if typing into the search box fails
pub fn fill_search_form<S: BrowserSession>(
    session: &S,
    config: &PortalConfig,
    criteria: &SearchCriteria,
) -> Result<(), SessionError> {
    let form = &config.form;
    let timeout = config.timeout();

    // ── Subject ─────────────────────────────────────────────────────
    let input = Locator::id(&form.search_input);
    if !session.wait_for(&input, timeout) {
        log::error!("Search box {input} not found");
        return Err(SessionError::MissingElement(input.to_string()));
    }
    session.fill(&input, criteria.subject().query())?;
    match criteria.subject() {
        SearchSubject::TaxId(nif) => log::info!("Searching by NIF/NIPC: {nif}"),
        SearchSubject::EntityName(name) => log::info!("Searching by designação: {name}"),
    }
    click_optional(session, &form.subject_radio(criteria.subject()), timeout, "subject type");

    // ── Dates ───────────────────────────────────────────────────────
    let dates = [
        ("start date", &form.start_date, criteria.start_date()),
        ("end date", &form.end_date, criteria.end_date()),
    ];
    for (label, id, value) in dates {
        let Some(value) = value else {
            continue;
        };
        let locator = Locator::id(id);
        if !session.wait_for(&locator, timeout) {
            log::warn!("The {label} field was not found");
            continue;
        }
        match session.fill(&locator, value) {
            Ok(()) => log::info!("Set {label}: {value}"),
            Err(e) => log::warn!("Could not set {label}: {e}"),
        }
    }

    // ── Court set ───────────────────────────────────────────────────
    if let Some(court) = criteria.court()
        && click_optional(session, &form.court_radio(court), timeout, "court filter")
    {
        log::info!("Court filter: {court}");
        session.pause(config.settle_delay());
    }

    // ── Acts ────────────────────────────────────────────────────────
    if let Some(group) = criteria.act_group() {
        match session.select_by_text(&Locator::id(&form.act_group), group) {
            Ok(()) => {
                log::info!("Act group: {group}");
                session.pause(config.settle_delay());
            }
            Err(e) => log::warn!("Could not select act group '{group}': {e}"),
        }
    }
    if let Some(act) = criteria.act() {
        match session.select_by_text(&Locator::id(&form.act), act) {
            Ok(()) => log::info!("Act: {act}"),
            Err(e) => log::warn!("Could not select act '{act}': {e}"),
        }
    }

    // ── Publication window ──────────────────────────────────────────
    if click_optional(session, &form.days_radio(criteria.days()), timeout, "days filter") {
        log::info!("Days filter: {}", criteria.days());
    }

    Ok(())
}

/// Clicks the search button, waits for the results and classifies the page.
///
/// # Errors
///
/// * [`SessionError::MissingElement`] if the button never becomes clickable
/// * [`SessionError::Validation`] if the portal shows validator messages
/// * [`SessionError::Dom`] if the resulting page cannot be read
pub fn submit_search<S: BrowserSession>(
    session: &S,
    config: &PortalConfig,
) -> Result<SubmitOutcome, SessionError> {
    let button = Locator::id(&config.form.search_button);
    if !session.wait_clickable(&button, config.timeout()) {
        log::error!("Search button {button} not found");
        return Err(SessionError::MissingElement(button.to_string()));
    }
    session.click(&button)?;
    log::info!("Search submitted, waiting for results");
    session.pause(config.results_delay());

    classify_results(session, config)
}

/// Decides what a freshly submitted search page shows.
///
/// # Errors
///
/// * [`SessionError::Validation`] if visible validator messages are present
/// * [`SessionError::Dom`] if the page source cannot be read
pub fn classify_results<P: Page>(
    page: &P,
    config: &PortalConfig,
) -> Result<SubmitOutcome, SessionError> {
    if page.page_source()?.contains(&config.extraction.total_marker) {
        log::info!("Results page loaded");
        return Ok(SubmitOutcome::ResultsListed);
    }

    if let Some(message) = page
        .find_first(&Locator::id(&config.form.no_results))
        .and_then(|label| visible_text(&label))
    {
        log::info!("No results: {message}");
        return Ok(SubmitOutcome::NoResults(message));
    }

    let messages: Vec<String> = page
        .find_all(&config.form.validation())?
        .iter()
        .filter_map(visible_text)
        .collect();
    if !messages.is_empty() {
        for message in &messages {
            log::error!("Validation error: {message}");
        }
        return Err(SessionError::Validation(messages));
    }

    log::warn!("Results page loaded but its format was not recognised");
    Ok(SubmitOutcome::Unrecognized)
}

fn click_optional<S: BrowserSession>(
    session: &S,
    locator: &Locator,
    timeout: Duration,
    what: &str,
) -> bool {
    if !session.wait_for(locator, timeout) {
        log::warn!("The {what} option {locator} was not found");
        return false;
    }
    match session.click(locator) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not click the {what} option: {e}");
            false
        }
    }
}

/// Trimmed text of `element` unless it is empty or hidden by inline style.
/// ASP.NET validators stay in the markup and are hidden while valid.
fn visible_text<E: Element>(element: &E) -> Option<String> {
    let style: String = element
        .attribute("style")
        .ok()
        .flatten()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if style.contains("display:none") || style.contains("visibility:hidden") {
        return None;
    }

    element
        .text()
        .ok()
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
