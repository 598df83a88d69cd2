//! [`BrowserSession`] backed by a headless Chrome instance.
//!
//! All calls block. Chrome is started with [`ChromeSession::launch`] and
//! shut down by [`BrowserSession::close`] or on drop.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use citius_extract::{DomError, Element, Locator, Page};
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;

use crate::config::PortalConfig;
use crate::{BrowserSession, SessionError};

/// Extra Chrome switches. The sandbox and window size are set through
/// [`LaunchOptions`] fields.
const CHROME_ARGS: [&str; 5] = [
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-notifications",
    "--disable-infobars",
];

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const ATTRIBUTE_JS: &str = "function(name) { \
    if (name === 'href' && typeof this.href === 'string' && this.href) { return this.href; } \
    return this.getAttribute(name); }";

const CLEAR_JS: &str = "function() { this.value = ''; }";

const CLICKABLE_JS: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    return !this.disabled && rect.width > 0 && rect.height > 0; }";

/// Selects the option whose visible text equals the argument and fires
/// `change` so ASP.NET postbacks run.
const SELECT_JS: &str = "function(label) { \
    const option = Array.from(this.options).find(o => o.text.trim() === label); \
    if (!option) { return false; } \
    this.value = option.value; \
    this.dispatchEvent(new Event('change', { bubbles: true })); \
    return true; }";

/// Builds the Chrome launch options for `config`.
#[must_use]
pub fn launch_options(config: &PortalConfig) -> LaunchOptions<'static> {
    LaunchOptions {
        headless: config.headless,
        sandbox: false,
        window_size: Some((config.window_width, config.window_height)),
        idle_browser_timeout: config.timeout() + config.extraction.budget(),
        args: CHROME_ARGS.into_iter().map(OsStr::new).collect(),
        ..LaunchOptions::default()
    }
}

/// A Chrome browser with one tab.
pub struct ChromeSession {
    tab: Option<Arc<Tab>>,
    browser: Option<Browser>,
}

impl ChromeSession {
    /// Starts Chrome and opens a tab.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Launch`] if Chrome cannot be started.
    pub fn launch(config: &PortalConfig) -> Result<Self, SessionError> {
        log::info!("Launching Chrome (headless: {})", config.headless);

        let browser =
            Browser::new(launch_options(config)).map_err(|e| SessionError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| SessionError::Launch(e.to_string()))?;
        tab.set_default_timeout(config.timeout());

        log::info!("Chrome started");
        Ok(Self {
            tab: Some(tab),
            browser: Some(browser),
        })
    }

    fn tab(&self) -> Result<&Tab, SessionError> {
        self.tab.as_deref().ok_or(SessionError::Closed)
    }

    fn element(&self, locator: &Locator) -> Result<headless_chrome::Element<'_>, SessionError> {
        match self.tab()?.find_element(locator.as_str()) {
            Ok(element) => Ok(element),
            Err(e) if e.is::<NoElementFound>() => {
                Err(SessionError::MissingElement(locator.to_string()))
            }
            Err(e) => Err(SessionError::Browser(e.to_string())),
        }
    }

    fn is_clickable(&self, locator: &Locator) -> bool {
        self.element(locator)
            .and_then(|element| {
                element
                    .call_js_fn(CLICKABLE_JS, Vec::new(), false)
                    .map_err(|e| SessionError::Browser(e.to_string()))
            })
            .is_ok_and(|result| result.value == Some(Value::Bool(true)))
    }
}

impl std::fmt::Debug for ChromeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeSession")
            .field("open", &self.tab.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// An element of the Chrome tab.
pub struct ChromeElement<'a> {
    inner: headless_chrome::Element<'a>,
}

impl Element for ChromeElement<'_> {
    fn text(&self) -> Result<String, DomError> {
        self.inner.get_inner_text().map_err(|e| dom_error(&e))
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, DomError> {
        let result = self
            .inner
            .call_js_fn(ATTRIBUTE_JS, vec![Value::String(name.to_owned())], false)
            .map_err(|e| dom_error(&e))?;
        Ok(match result.value {
            Some(Value::String(value)) => Some(value),
            _ => None,
        })
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, DomError> {
        match self.inner.find_elements(locator.as_str()) {
            Ok(found) => Ok(found.into_iter().map(|inner| Self { inner }).collect()),
            Err(e) if e.is::<NoElementFound>() => Ok(Vec::new()),
            Err(e) => Err(dom_error(&e)),
        }
    }
}

impl Page for ChromeSession {
    type Element<'a> = ChromeElement<'a>;

    fn find_all(&self, locator: &Locator) -> Result<Vec<ChromeElement<'_>>, DomError> {
        let tab = self.tab().map_err(|e| DomError::Backend(e.to_string()))?;
        match tab.find_elements(locator.as_str()) {
            Ok(found) => Ok(found
                .into_iter()
                .map(|inner| ChromeElement { inner })
                .collect()),
            Err(e) if e.is::<NoElementFound>() => Ok(Vec::new()),
            Err(e) => Err(dom_error(&e)),
        }
    }

    fn page_source(&self) -> Result<String, DomError> {
        let tab = self.tab().map_err(|e| DomError::Backend(e.to_string()))?;
        tab.get_content().map_err(|e| dom_error(&e))
    }

    fn body_text(&self) -> Result<String, DomError> {
        let tab = self.tab().map_err(|e| DomError::Backend(e.to_string()))?;
        tab.find_element("body")
            .and_then(|body| body.get_inner_text())
            .map_err(|e| dom_error(&e))
    }
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .and_then(Tab::wait_until_navigated)
            .map_err(|e| SessionError::Navigation {
                url: url.to_owned(),
                message: e.to_string(),
            })?;
        log::debug!("Navigated to {}", tab.get_url());
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> bool {
        let Ok(tab) = self.tab() else {
            return false;
        };
        match tab.wait_for_element_with_custom_timeout(locator.as_str(), timeout) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Timed out waiting for {locator}: {e}");
                false
            }
        }
    }

    fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_clickable(locator) {
                return true;
            }
            if Instant::now() >= deadline {
                log::warn!("Timed out waiting for {locator} to become clickable");
                return false;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn click(&self, locator: &Locator) -> Result<(), SessionError> {
        self.element(locator)?
            .click()
            .map(|_| ())
            .map_err(|e| SessionError::Browser(e.to_string()))
    }

    fn fill(&self, locator: &Locator, text: &str) -> Result<(), SessionError> {
        let element = self.element(locator)?;
        element
            .call_js_fn(CLEAR_JS, Vec::new(), false)
            .map_err(|e| SessionError::Browser(e.to_string()))?;
        element
            .type_into(text)
            .map(|_| ())
            .map_err(|e| SessionError::Browser(e.to_string()))
    }

    fn select_by_text(&self, locator: &Locator, text: &str) -> Result<(), SessionError> {
        let result = self
            .element(locator)?
            .call_js_fn(SELECT_JS, vec![Value::String(text.to_owned())], false)
            .map_err(|e| SessionError::Browser(e.to_string()))?;
        if result.value == Some(Value::Bool(true)) {
            Ok(())
        } else {
            Err(SessionError::Browser(format!("no option '{text}' in {locator}")))
        }
    }

    fn close(&mut self) {
        if let Some(tab) = self.tab.take()
            && let Err(e) = tab.close(true)
        {
            log::debug!("Closing tab failed: {e}");
        }
        if self.browser.take().is_some() {
            log::info!("Browser closed");
        }
    }
}

/// Maps a Chrome `DevTools` error to a [`DomError`]. Node lookups that fail
/// because the page re-rendered count as stale.
fn dom_error(error: &impl std::fmt::Display) -> DomError {
    let message = error.to_string();
    if is_stale_message(&message) {
        DomError::Stale(message)
    } else {
        DomError::Backend(message)
    }
}

fn is_stale_message(message: &str) -> bool {
    const STALE_MARKERS: [&str; 3] = [
        "No node with given id",
        "Could not find node",
        "Cannot find context with specified id",
    ];
    STALE_MARKERS.iter().any(|marker| message.contains(marker))
}
