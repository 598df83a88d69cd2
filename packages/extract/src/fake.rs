//! Scripted [`Page`] for strategy tests that need DOM failures an HTML
//! snapshot cannot produce.

use crate::dom::{DomError, Element, Locator, Page};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    text: String,
    stale: bool,
    broken: bool,
    children: Vec<(String, Self)>,
}

impl FakeElement {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            ..Self::default()
        }
    }

    /// Every call fails with [`DomError::Stale`].
    pub fn stale() -> Self {
        Self {
            stale: true,
            ..Self::default()
        }
    }

    /// Lookups fail with [`DomError::Backend`]; `text()` still works.
    pub fn broken(text: &str) -> Self {
        Self {
            broken: true,
            ..Self::new(text)
        }
    }

    pub fn child(mut self, locator: &str, child: Self) -> Self {
        self.children.push((locator.to_owned(), child));
        self
    }

    fn check(&self) -> Result<(), DomError> {
        if self.stale {
            Err(DomError::Stale("node detached".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl Element for FakeElement {
    fn text(&self) -> Result<String, DomError> {
        self.check()?;
        Ok(self.text.clone())
    }

    fn attribute(&self, _name: &str) -> Result<Option<String>, DomError> {
        self.check()?;
        Ok(None)
    }

    fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, DomError> {
        self.check()?;
        if self.broken {
            return Err(DomError::Backend("lookup failed".to_owned()));
        }
        Ok(self
            .children
            .iter()
            .filter(|(l, _)| l == locator.as_str())
            .map(|(_, c)| c.clone())
            .collect())
    }
}

#[derive(Debug)]
pub struct FakePage {
    body: String,
    elements: Vec<(String, FakeElement)>,
}

impl FakePage {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_owned(),
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, locator: &str, element: FakeElement) -> Self {
        self.elements.push((locator.to_owned(), element));
        self
    }
}

impl Page for FakePage {
    type Element<'a> = FakeElement;

    fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>, DomError> {
        Ok(self
            .elements
            .iter()
            .filter(|(l, _)| l == locator.as_str())
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn page_source(&self) -> Result<String, DomError> {
        Ok(format!("<html><body>{}</body></html>", self.body))
    }

    fn body_text(&self) -> Result<String, DomError> {
        Ok(self.body.clone())
    }
}
