#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Browser side of the Citius scraper.
//!
//! [`BrowserSession`] is the small set of interactions the search form
//! needs on top of the read-only [`Page`] surface the extractors use.
//! [`chrome::ChromeSession`] implements it over a headless Chrome instance;
//! [`form`] drives the search form through it, and [`config`] holds the
//! portal addresses, element ids and timings.

pub mod chrome;
pub mod config;
#[cfg(test)]
mod fake;
pub mod form;

use std::time::Duration;

use citius_extract::{DomError, Locator, Page};

pub use config::{ConfigError, FormIds, PortalConfig};
pub use form::SubmitOutcome;

/// Errors raised while driving the browser.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The browser could not be started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// A page failed to load.
    #[error("failed to navigate to {url}: {message}")]
    Navigation {
        /// Requested address.
        url: String,
        /// Backend message.
        message: String,
    },

    /// A required control never appeared.
    #[error("element '{0}' not found")]
    MissingElement(String),

    /// The portal rejected the search form.
    #[error("search form rejected: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Reading the page failed.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// Any other browser failure.
    #[error("browser error: {0}")]
    Browser(String),

    /// The session was already closed.
    #[error("browser session is closed")]
    Closed,
}

/// A live page that can also be navigated and typed into.
///
/// Waits return `false` rather than an error when the element does not show
/// up in time; the form driver decides whether that is fatal.
pub trait BrowserSession: Page {
    /// Loads `url` and waits for navigation to settle.
    ///
    /// # Errors
    ///
    /// * [`SessionError::Navigation`] if the page does not load
    /// * [`SessionError::Closed`] after [`Self::close`]
    fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Waits up to `timeout` for `locator` to be present.
    fn wait_for(&self, locator: &Locator, timeout: Duration) -> bool;

    /// Waits up to `timeout` for `locator` to be present, enabled and
    /// rendered.
    fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> bool;

    /// Clicks the first element matching `locator`.
    ///
    /// # Errors
    ///
    /// * [`SessionError::MissingElement`] if nothing matches
    /// * [`SessionError::Browser`] if the click fails
    fn click(&self, locator: &Locator) -> Result<(), SessionError>;

    /// Clears the input matching `locator` and types `text` into it.
    ///
    /// # Errors
    ///
    /// * [`SessionError::MissingElement`] if nothing matches
    /// * [`SessionError::Browser`] if typing fails
    fn fill(&self, locator: &Locator, text: &str) -> Result<(), SessionError>;

    /// Picks the `<option>` whose visible text is `text` in the dropdown
    /// matching `locator`.
    ///
    /// # Errors
    ///
    /// * [`SessionError::MissingElement`] if the dropdown is absent
    /// * [`SessionError::Browser`] if no option has that text
    fn select_by_text(&self, locator: &Locator, text: &str) -> Result<(), SessionError>;

    /// Gives the page time to react (postbacks, result rendering).
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    /// Shuts the browser down. Calling it again does nothing.
    fn close(&mut self);
}
