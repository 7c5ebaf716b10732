//! The page-automation seam.
//!
//! Everything above this module talks to a [`MapPage`]; the real browser
//! lives in [`crate::session`] and tests drive an in-memory page instead.

use std::future::Future;
use std::time::Duration;

use crate::error::BrowserError;

/// A live, query-able rendered document.
///
/// Element handles are only valid until the page re-renders. Operations on a
/// handle that has gone stale fail with [`BrowserError::StaleElement`] (or an
/// interaction error, depending on the backend); callers re-resolve by index
/// rather than retrying on the same handle.
pub trait MapPage: Send + Sync {
    type Element: Send + Sync;

    fn goto(&self, url: &str) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// All elements currently matching a CSS selector, in document order.
    /// No match is an empty vector, not an error.
    fn find_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Element>, BrowserError>> + Send;

    /// Rendered text of an element.
    fn text_of(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<Option<String>, BrowserError>> + Send;

    fn attribute_of(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, BrowserError>> + Send;

    fn scroll_into_view(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Element-level (input-event) click.
    fn click(&self, element: &Self::Element)
        -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Programmatic `element.click()` from script.
    fn script_click(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Scrolls the scrollable container matching `selector` to its bottom and
    /// returns its new scroll height, or `None` if no such container exists.
    fn scroll_feed(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<u64>, BrowserError>> + Send;

    /// Full visible text of the first element matching `selector`.
    fn inner_text(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<String>, BrowserError>> + Send;

    /// Browser-level "navigate back".
    fn history_back(&self) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Waits up to `timeout` for at least one element matching `selector`.
    fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<bool, BrowserError>> + Send;

    /// `true` once the underlying session has gone away.
    fn is_closed(&self) -> bool;

    /// Releases the session. Safe to call more than once.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Found-or-absent helpers shared by the detector, navigator and extractor.
///
/// Lookup errors collapse to "absent" here so that fallback chains only ever
/// see `Option`s.
pub(crate) mod lookup {
    use super::MapPage;

    pub(crate) async fn exists<P: MapPage>(page: &P, selector: &str) -> bool {
        page.find_all(selector)
            .await
            .is_ok_and(|elements| !elements.is_empty())
    }

    pub(crate) async fn first<P: MapPage>(page: &P, selector: &str) -> Option<P::Element> {
        page.find_all(selector).await.ok()?.into_iter().next()
    }

    /// Trimmed, non-empty texts of every element matching `selector`.
    pub(crate) async fn texts<P: MapPage>(page: &P, selector: &str) -> Vec<String> {
        let Ok(elements) = page.find_all(selector).await else {
            return Vec::new();
        };
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(text) = non_empty(page.text_of(element).await.ok().flatten()) {
                texts.push(text);
            }
        }
        texts
    }

    /// Trimmed, non-empty values of `attribute` across every match.
    pub(crate) async fn attributes<P: MapPage>(
        page: &P,
        selector: &str,
        attribute: &str,
    ) -> Vec<String> {
        let Ok(elements) = page.find_all(selector).await else {
            return Vec::new();
        };
        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(value) = non_empty(page.attribute_of(element, attribute).await.ok().flatten())
            {
                values.push(value);
            }
        }
        values
    }

    pub(crate) async fn first_text<P: MapPage>(page: &P, selector: &str) -> Option<String> {
        texts(page, selector).await.into_iter().next()
    }

    pub(crate) async fn first_attribute<P: MapPage>(
        page: &P,
        selector: &str,
        attribute: &str,
    ) -> Option<String> {
        attributes(page, selector, attribute).await.into_iter().next()
    }

    pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
