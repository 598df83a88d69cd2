//! [`Page`] over a parsed HTML snapshot.
//!
//! Used for saved result pages and in tests. Element text is rendered the
//! way a browser reports visible text: block elements and `<br>` break
//! lines, table cells are tab separated, and `<script>`/`<style>`/form
//! dropdown contents are dropped.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::dom::{DomError, Element, Locator, Page};

/// Elements that start and end a line.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "caption",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "legend",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tbody",
    "tfoot",
    "thead",
    "tr",
    "ul",
];

/// Elements whose contents never count as visible text.
const SKIPPED_TAGS: &[&str] = &[
    "head", "noscript", "option", "script", "select", "style", "template", "title",
];

/// A parsed HTML document.
pub struct HtmlPage {
    document: Html,
    source: String,
    base_url: Option<Url>,
}

impl HtmlPage {
    /// Parses a full HTML document.
    #[must_use]
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let document = Html::parse_document(&source);
        Self {
            document,
            source,
            base_url: None,
        }
    }

    /// Resolves relative `href` attributes against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `base` is not an absolute URL.
    pub fn with_base_url(mut self, base: &str) -> Result<Self, url::ParseError> {
        self.base_url = Some(Url::parse(base)?);
        Ok(self)
    }
}

impl std::fmt::Debug for HtmlPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlPage")
            .field("len", &self.source.len())
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

/// An element of an [`HtmlPage`].
#[derive(Clone, Copy)]
pub struct HtmlElement<'a> {
    element: ElementRef<'a>,
    base_url: Option<&'a Url>,
}

impl<'a> HtmlElement<'a> {
    const fn new(element: ElementRef<'a>, base_url: Option<&'a Url>) -> Self {
        Self { element, base_url }
    }
}

impl Element for HtmlElement<'_> {
    fn text(&self) -> Result<String, DomError> {
        Ok(render_text(self.element))
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, DomError> {
        let Some(value) = self.element.value().attr(name) else {
            return Ok(None);
        };
        if name == "href"
            && let Some(base) = self.base_url
            && let Ok(resolved) = base.join(value)
        {
            return Ok(Some(resolved.to_string()));
        }
        Ok(Some(value.to_owned()))
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, DomError> {
        let selector = parse_selector(locator)?;
        Ok(self
            .element
            .select(&selector)
            .map(|e| Self::new(e, self.base_url))
            .collect())
    }
}

impl Page for HtmlPage {
    type Element<'a> = HtmlElement<'a>;

    fn find_all(&self, locator: &Locator) -> Result<Vec<HtmlElement<'_>>, DomError> {
        let selector = parse_selector(locator)?;
        Ok(self
            .document
            .select(&selector)
            .map(|e| HtmlElement::new(e, self.base_url.as_ref()))
            .collect())
    }

    fn page_source(&self) -> Result<String, DomError> {
        Ok(self.source.clone())
    }

    fn body_text(&self) -> Result<String, DomError> {
        let body = self
            .find_first(&Locator::tag("body"))
            .ok_or_else(|| DomError::Backend("document has no <body>".to_owned()))?;
        body.text()
    }
}

fn parse_selector(locator: &Locator) -> Result<Selector, DomError> {
    Selector::parse(locator.as_str()).map_err(|e| DomError::InvalidLocator {
        locator: locator.to_string(),
        message: e.to_string(),
    })
}

/// Renders the visible text of `element`.
///
/// Whitespace inside text runs collapses to single spaces, blank lines are
/// dropped and every line is trimmed.
#[must_use]
pub fn render_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_rendered(element, &mut raw);

    raw.lines()
        .map(|line| line.trim_matches(' '))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_rendered(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            push_text(text, out);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child.value().name();
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }
        if name == "br" {
            line_break(out);
            continue;
        }
        if matches!(name, "td" | "th") && !out.is_empty() && !out.ends_with('\n') {
            trim_trailing_spaces(out);
            out.push('\t');
        }

        let block = BLOCK_TAGS.contains(&name);
        if block {
            line_break(out);
        }
        push_rendered(child, out);
        if block {
            line_break(out);
        }
    }
}

fn push_text(text: &str, out: &mut String) {
    for c in text.chars() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with([' ', '\n', '\t']) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn line_break(out: &mut String) {
    trim_trailing_spaces(out);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn trim_trailing_spaces(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
}
