//! Scripted [`BrowserSession`] over HTML snapshots.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use citius_extract::html::{HtmlElement, HtmlPage};
use citius_extract::{DomError, Element, Locator, Page};

use crate::{BrowserSession, SessionError};

/// Serves `form` until the button `submit` is clicked, then `results`.
pub struct FakeSession {
    form: HtmlPage,
    results: Option<HtmlPage>,
    submit: Option<Locator>,
    submitted: Cell<bool>,
    url: Option<String>,
    fail_navigation: bool,
    actions: RefCell<Vec<String>>,
}

impl FakeSession {
    pub fn new(form: &str) -> Self {
        Self {
            form: HtmlPage::parse(form),
            results: None,
            submit: None,
            submitted: Cell::new(false),
            url: None,
            fail_navigation: false,
            actions: RefCell::new(Vec::new()),
        }
    }

    pub fn with_results(mut self, submit: Locator, results: &str) -> Self {
        self.submit = Some(submit);
        self.results = Some(HtmlPage::parse(results));
        self
    }

    pub const fn unreachable(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.borrow().clone()
    }

    fn current(&self) -> &HtmlPage {
        match &self.results {
            Some(results) if self.submitted.get() => results,
            _ => &self.form,
        }
    }

    fn record(&self, action: String) {
        self.actions.borrow_mut().push(action);
    }

    fn require(&self, locator: &Locator) -> Result<HtmlElement<'_>, SessionError> {
        if self.url.is_none() {
            return Err(SessionError::MissingElement(locator.to_string()));
        }
        self.find_first(locator)
            .ok_or_else(|| SessionError::MissingElement(locator.to_string()))
    }
}

impl Page for FakeSession {
    type Element<'a> = HtmlElement<'a>;

    fn find_all(&self, locator: &Locator) -> Result<Vec<HtmlElement<'_>>, DomError> {
        self.current().find_all(locator)
    }

    fn page_source(&self) -> Result<String, DomError> {
        self.current().page_source()
    }

    fn body_text(&self) -> Result<String, DomError> {
        self.current().body_text()
    }
}

impl BrowserSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        if self.fail_navigation {
            return Err(SessionError::Navigation {
                url: url.to_owned(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_owned(),
            });
        }
        self.record(format!("navigate {url}"));
        self.url = Some(url.to_owned());
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, _timeout: Duration) -> bool {
        self.url.is_some() && self.find_first(locator).is_some()
    }

    fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> bool {
        self.wait_for(locator, timeout)
    }

    fn click(&self, locator: &Locator) -> Result<(), SessionError> {
        self.require(locator)?;
        self.record(format!("click {locator}"));
        if self.submit.as_ref() == Some(locator) {
            self.submitted.set(true);
        }
        Ok(())
    }

    fn fill(&self, locator: &Locator, text: &str) -> Result<(), SessionError> {
        self.require(locator)?;
        self.record(format!("fill {locator}={text}"));
        Ok(())
    }

    fn select_by_text(&self, locator: &Locator, text: &str) -> Result<(), SessionError> {
        let select = self.require(locator)?;
        let found = select
            .find_all(&Locator::tag("option"))?
            .iter()
            .any(|option| option.text().is_ok_and(|t| t.trim() == text));
        if !found {
            return Err(SessionError::Browser(format!("no option '{text}' in {locator}")));
        }
        self.record(format!("select {locator}={text}"));
        Ok(())
    }

    fn pause(&self, duration: Duration) {
        self.record(format!("pause {}ms", duration.as_millis()));
    }

    fn close(&mut self) {
        self.record("close".to_owned());
    }
}
