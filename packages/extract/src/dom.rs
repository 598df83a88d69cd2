//! Minimal DOM surface the extraction strategies read through.
//!
//! A live browser session and a parsed HTML snapshot both implement
//! [`Page`]. Lookups are CSS selectors wrapped in [`Locator`]. Absence is
//! never an error: a lookup that matches nothing returns an empty `Vec`.

use std::fmt;

/// Errors raised while reading a page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The element went away between lookup and use. Transient; the caller
    /// skips the affected row or item.
    #[error("stale element: {0}")]
    Stale(String),

    /// The locator is not a valid CSS selector.
    #[error("invalid locator '{locator}': {message}")]
    InvalidLocator {
        /// The rejected selector.
        locator: String,
        /// Parser message.
        message: String,
    },

    /// Any other failure reported by the page backend.
    #[error("DOM error: {0}")]
    Backend(String),
}

impl DomError {
    /// Returns `true` for errors the caller should recover from by skipping
    /// the current unit of work.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Stale(_))
    }
}

/// A CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    /// Locates by arbitrary CSS selector.
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    /// Locates by element id.
    #[must_use]
    pub fn id(id: &str) -> Self {
        Self(format!("#{id}"))
    }

    /// Locates by tag name.
    #[must_use]
    pub fn tag(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// The selector text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An element on a [`Page`].
pub trait Element: Sized {
    /// Visible text, one line per rendered line.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the backend cannot read the element.
    fn text(&self) -> Result<String, DomError>;

    /// Attribute value. For `href` this is the resolved absolute URL when the
    /// backend knows the page address.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the backend cannot read the element.
    fn attribute(&self, name: &str) -> Result<Option<String>, DomError>;

    /// Descendants matching `locator`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] for an invalid locator or a backend failure.
    fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, DomError>;
}

/// A loaded page.
pub trait Page {
    /// Element handle type, borrowing from the page.
    type Element<'a>: Element
    where
        Self: 'a;

    /// Elements matching `locator`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] for an invalid locator or a backend failure.
    fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element<'_>>, DomError>;

    /// The raw page markup.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the backend cannot serialize the page.
    fn page_source(&self) -> Result<String, DomError>;

    /// Visible text of `<body>`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError`] if the page has no body or it cannot be read.
    fn body_text(&self) -> Result<String, DomError>;

    /// First element matching `locator`, or `None` when absent or on error.
    fn find_first(&self, locator: &Locator) -> Option<Self::Element<'_>> {
        match self.find_all(locator) {
            Ok(found) => found.into_iter().next(),
            Err(e) => {
                log::debug!("Lookup of '{locator}' failed: {e}");
                None
            }
        }
    }
}

/// Collects the `href` of every link under `element`, skipping links
/// without one.
///
/// # Errors
///
/// Returns [`DomError`] if the links cannot be enumerated or read.
pub fn collect_links<E: Element>(element: &E) -> Result<Vec<String>, DomError> {
    let mut links = Vec::new();
    for anchor in element.find_all(&Locator::tag("a"))? {
        if let Some(href) = anchor.attribute("href")?
            && !href.is_empty()
        {
            links.push(href);
        }
    }
    Ok(links)
}
