//! Loading the result list, re-resolving items by index, and returning to the
//! list after each detail view.

use std::ops::Range;
use std::time::Duration;

use crate::error::ScraperError;
use crate::page::{lookup, MapPage};
use crate::pacing::{self, Pacing};
use crate::selectors;

/// How long to wait for the first list item to appear after load.
const LIST_WAIT: Duration = Duration::from_secs(10);

/// The slice of the result list one search will process.
///
/// Holds indices, not handles: every item is re-resolved from the live page
/// right before it is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListWindow {
    pub item_selector: &'static str,
    pub range: Range<usize>,
    /// Items present when loading stopped.
    pub loaded: usize,
}

impl ListWindow {
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// How the list view was restored after a detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
    BackControl,
    HistoryBack,
    Failed,
}

pub struct ListNavigator<'a, P: MapPage> {
    page: &'a P,
    pacing: &'a dyn Pacing,
    max_scroll_attempts: u32,
}

impl<'a, P: MapPage> ListNavigator<'a, P> {
    pub fn new(page: &'a P, pacing: &'a dyn Pacing, max_scroll_attempts: u32) -> Self {
        Self {
            page,
            pacing,
            max_scroll_attempts,
        }
    }

    /// Scrolls the feed until at least `skip + max` items are loaded, the
    /// feed stops growing, or the scroll budget runs out, then returns the
    /// `[skip, skip + max)` window clamped to what actually loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::ListNotFound`] if no item selector matches.
    pub async fn load_window(
        &self,
        url: &str,
        skip: usize,
        max: usize,
    ) -> Result<ListWindow, ScraperError> {
        // Only used to give the list a chance to render; discovery below decides.
        let _ = self.page.wait_for(selectors::LIST_ITEMS[0], LIST_WAIT).await;

        let Some(item_selector) = self.discover_item_selector().await else {
            return Err(ScraperError::ListNotFound {
                url: url.to_string(),
                selectors: selectors::LIST_ITEMS.join(", "),
            });
        };

        let target = skip.saturating_add(max);
        let mut loaded = self.count(item_selector).await;
        let mut last_height = None;
        let mut attempts = 0;

        while loaded < target && attempts < self.max_scroll_attempts {
            let height = match self.page.scroll_feed(selectors::FEED).await {
                Ok(Some(height)) => height,
                Ok(None) => {
                    tracing::debug!("no scrollable feed; using items already loaded");
                    break;
                }
                Err(err) => {
                    tracing::debug!(error = %err, "feed scroll failed");
                    break;
                }
            };
            attempts += 1;
            pacing::pause(self.pacing, pacing::SCROLL).await;
            loaded = self.count(item_selector).await;
            tracing::debug!(attempt = attempts, loaded, target, height, "scrolled result feed");

            if last_height == Some(height) {
                break;
            }
            last_height = Some(height);
        }

        let range = skip.min(loaded)..target.min(loaded);
        tracing::info!(
            item_selector,
            loaded,
            skip,
            max,
            selected = range.len(),
            "result list loaded"
        );
        Ok(ListWindow {
            item_selector,
            range,
            loaded,
        })
    }

    async fn discover_item_selector(&self) -> Option<&'static str> {
        for selector in selectors::LIST_ITEMS {
            if lookup::exists(self.page, selector).await {
                return Some(selector);
            }
        }
        None
    }

    async fn count(&self, selector: &str) -> usize {
        self.page.find_all(selector).await.map_or(0, |items| items.len())
    }

    /// Re-finds the item at `index` on the current page.
    ///
    /// Returns `None` (and logs) if the list no longer has that many items.
    pub async fn resolve(&self, window: &ListWindow, index: usize) -> Option<P::Element> {
        let mut items = match self.page.find_all(window.item_selector).await {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(index, error = %err, "could not re-resolve list items; skipping");
                return None;
            }
        };
        if index >= items.len() {
            tracing::warn!(
                index,
                available = items.len(),
                "list item no longer exists; skipping"
            );
            return None;
        }
        Some(items.swap_remove(index))
    }

    /// Returns to the list view: a back control if one is present, else
    /// browser history. Best-effort; a failure here is recovered by the next
    /// [`resolve`](Self::resolve).
    pub async fn restore(&self) -> Restore {
        for selector in selectors::BACK_CONTROLS {
            let Some(control) = lookup::first(self.page, selector).await else {
                continue;
            };
            if self.page.click(&control).await.is_ok() {
                pacing::pause(self.pacing, pacing::RESTORE).await;
                return Restore::BackControl;
            }
        }

        match self.page.history_back().await {
            Ok(()) => {
                pacing::pause(self.pacing, pacing::RESTORE).await;
                Restore::HistoryBack
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not return to the result list");
                Restore::Failed
            }
        }
    }
}
