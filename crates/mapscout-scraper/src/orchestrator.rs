//! One (query, location) search from page load to filtered batch.

use std::sync::Arc;

use mapscout_core::{AppConfig, BusinessRecord, FilterCriteria, SearchLocation};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use crate::error::{BrowserError, ScraperError};
use crate::extractor::{Extraction, FieldExtractor};
use crate::harvest::EmailHarvester;
use crate::navigator::ListNavigator;
use crate::page::{lookup, MapPage};
use crate::pacing::{self, Pacing};
use crate::selectors;

/// Per-run search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub base_url: String,
    pub country: String,
    pub max_results: usize,
    pub skip_first: usize,
    pub max_scroll_attempts: u32,
    pub estimate_age: bool,
}

impl SearchSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.search_base_url.clone(),
            country: config.country.clone(),
            max_results: config.max_results,
            skip_first: config.skip_first,
            max_scroll_attempts: config.max_scroll_attempts,
            estimate_age: false,
        }
    }
}

/// Builds the list query URL:
/// `{base}{query} en {district}, {province}, {department}, {country}` with
/// each word percent-encoded and words joined by `+`.
#[must_use]
pub fn search_url(base_url: &str, query: &str, location: &SearchLocation, country: &str) -> String {
    let text = format!("{query} en {}, {country}", location.label());
    let encoded = text
        .split_whitespace()
        .map(|word| utf8_percent_encode(word, NON_ALPHANUMERIC).to_string())
        .collect::<Vec<_>>()
        .join("+");
    format!("{base_url}{encoded}")
}

/// Drives searches against a single page session.
pub struct SearchOrchestrator<P: MapPage> {
    page: P,
    pacing: Arc<dyn Pacing>,
    harvester: EmailHarvester,
    settings: SearchSettings,
}

impl<P: MapPage> SearchOrchestrator<P> {
    pub fn new(
        page: P,
        pacing: Arc<dyn Pacing>,
        harvester: EmailHarvester,
        settings: SearchSettings,
    ) -> Self {
        Self {
            page,
            pacing,
            harvester,
            settings,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn pacing(&self) -> &dyn Pacing {
        self.pacing.as_ref()
    }

    /// Searches one location and returns the records that pass `filters`,
    /// in extraction order.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Browser`] with a navigation error if the page never
    ///   loads, or [`ScraperError::ListNotFound`] if it shows no result list.
    ///   Both are location-level ([`ScraperError::is_fatal`] is `false`).
    /// - [`ScraperError::Browser`] with [`BrowserError::SessionClosed`] if the
    ///   session dies mid-search. This is fatal for the run.
    pub async fn search_location(
        &self,
        query: &str,
        location: &SearchLocation,
        filters: &FilterCriteria,
    ) -> Result<Vec<BusinessRecord>, ScraperError> {
        let pacing = self.pacing.as_ref();
        let url = search_url(&self.settings.base_url, query, location, &self.settings.country);
        tracing::info!(query, location = %location, url, "searching location");

        self.page.goto(&url).await?;
        pacing::pause(pacing, pacing::AFTER_LOAD).await;
        self.dismiss_consent().await;
        pacing::pause(pacing, pacing::LIST_SETTLE).await;

        let navigator = ListNavigator::new(&self.page, pacing, self.settings.max_scroll_attempts);
        let window = navigator
            .load_window(&url, self.settings.skip_first, self.settings.max_results)
            .await?;

        let extractor = FieldExtractor::new(
            &self.page,
            pacing,
            &self.harvester,
            self.settings.estimate_age,
        );

        let mut records = Vec::with_capacity(window.len());
        for index in window.range.clone() {
            self.ensure_session()?;
            pacing::pause(pacing, pacing::BETWEEN_ITEMS).await;

            let Some(item) = navigator.resolve(&window, index).await else {
                continue;
            };
            let extraction = extractor.extract(&item).await;
            if extraction.left_list() {
                navigator.restore().await;
            }

            match extraction {
                Extraction::Extracted(fields) => {
                    if let Some(record) = BusinessRecord::assemble(fields, location, query) {
                        records.push(record);
                    }
                }
                Extraction::Discarded => tracing::debug!(index, "listing discarded"),
                Extraction::NotOpened => tracing::warn!(index, "listing could not be opened"),
            }
        }
        self.ensure_session()?;

        let extracted = records.len();
        let kept = filters.apply(records);
        tracing::info!(
            location = %location,
            extracted,
            kept = kept.len(),
            "location search finished"
        );
        Ok(kept)
    }

    fn ensure_session(&self) -> Result<(), ScraperError> {
        if self.page.is_closed() {
            Err(BrowserError::SessionClosed.into())
        } else {
            Ok(())
        }
    }

    /// Clicks a cookie/consent "accept" button if one is showing.
    async fn dismiss_consent(&self) {
        let Ok(buttons) = self.page.find_all(selectors::CONSENT_BUTTONS).await else {
            return;
        };
        for button in &buttons {
            let text = lookup::non_empty(self.page.text_of(button).await.ok().flatten());
            let is_accept = text.is_some_and(|t| {
                selectors::CONSENT_LABELS
                    .iter()
                    .any(|label| t.contains(label))
            });
            if !is_accept {
                continue;
            }
            if self.page.click(button).await.is_ok() {
                tracing::debug!("consent dialog dismissed");
                pacing::pause(self.pacing.as_ref(), pacing::CONSENT).await;
            }
            return;
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
