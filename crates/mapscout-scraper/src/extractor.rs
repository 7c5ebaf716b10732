//! Opening one list item and pulling a business out of its detail view.
//!
//! Every field is an ordered chain of lookup strategies; the first one that
//! finds something wins and absence falls through to the next. Nothing in
//! here fails outright: a missing field is `None`, and a listing with no
//! resolvable name is reported as [`Extraction::Discarded`].

use mapscout_core::ListingFields;

use crate::detector;
use crate::harvest::EmailHarvester;
use crate::page::{lookup, MapPage};
use crate::pacing::{self, Pacing};
use crate::parse;
use crate::selectors;

/// Outcome of processing one list item.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Neither click strategy worked; the page is still on the list.
    NotOpened,
    /// A view opened but no name could be resolved.
    Discarded,
    Extracted(ListingFields),
}

impl Extraction {
    /// `true` when the page may have left the list and needs restoring.
    #[must_use]
    pub fn left_list(&self) -> bool {
        !matches!(self, Self::NotOpened)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameSource {
    ItemLabel,
    Heading,
    NameContainer,
}

const NAME_SOURCES: [NameSource; 3] = [
    NameSource::ItemLabel,
    NameSource::Heading,
    NameSource::NameContainer,
];

pub struct FieldExtractor<'a, P: MapPage> {
    page: &'a P,
    pacing: &'a dyn Pacing,
    harvester: &'a EmailHarvester,
    estimate_age: bool,
}

impl<'a, P: MapPage> FieldExtractor<'a, P> {
    pub fn new(
        page: &'a P,
        pacing: &'a dyn Pacing,
        harvester: &'a EmailHarvester,
        estimate_age: bool,
    ) -> Self {
        Self {
            page,
            pacing,
            harvester,
            estimate_age,
        }
    }

    /// Clicks `item`, waits for the detail view, and extracts its fields.
    ///
    /// Does not return to the list; that is the caller's job when
    /// [`Extraction::left_list`] is `true`.
    pub async fn extract(&self, item: &P::Element) -> Extraction {
        // Read before clicking: the click re-renders the list and stales `item`.
        let item_label = self.page.attribute_of(item, "aria-label").await.ok().flatten();

        if !self.open(item).await {
            return Extraction::NotOpened;
        }
        pacing::pause(self.pacing, pacing::DETAIL_RENDER).await;

        if !detector::is_detail_open(self.page).await {
            tracing::warn!("detail view not confirmed; extracting anyway");
        }

        let Some(name) = self.resolve_name(item_label.as_deref()).await else {
            tracing::debug!("no business name resolved; discarding");
            return Extraction::Discarded;
        };

        let website = lookup::first_attribute(self.page, selectors::WEBSITE, "href").await;
        let emails = self
            .harvester
            .harvest(self.page, website.as_deref(), self.pacing)
            .await;
        let age_days = if self.estimate_age {
            self.oldest_review_age().await
        } else {
            None
        };

        let fields = ListingFields {
            name: Some(name),
            phone: self.phone().await,
            address: lookup::first_attribute(self.page, selectors::ADDRESS, "aria-label")
                .await
                .map(|label| parse::strip_label_prefix(&label, &selectors::ADDRESS_PREFIXES)),
            category: lookup::first_text(self.page, selectors::CATEGORY).await,
            hours: self.hours().await,
            rating: self.rating().await,
            review_count: self.review_count().await,
            website,
            emails,
            age_days,
        };

        tracing::info!(
            name = fields.name.as_deref().unwrap_or_default(),
            rating = fields.rating.unwrap_or_default(),
            reviews = fields.review_count.unwrap_or_default(),
            has_phone = fields.phone.is_some(),
            has_website = fields.website.is_some(),
            emails = fields.emails.len(),
            "extracted listing"
        );
        Extraction::Extracted(fields)
    }

    async fn open(&self, item: &P::Element) -> bool {
        if let Err(err) = self.page.scroll_into_view(item).await {
            tracing::debug!(error = %err, "scroll into view failed");
        }
        match self.page.click(item).await {
            Ok(()) => return true,
            Err(err) => tracing::debug!(error = %err, "click failed; trying script click"),
        }
        match self.page.script_click(item).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "could not open list item");
                false
            }
        }
    }

    async fn resolve_name(&self, item_label: Option<&str>) -> Option<String> {
        for source in NAME_SOURCES {
            let found = match source {
                NameSource::ItemLabel => item_label.and_then(name_from_label),
                NameSource::Heading => lookup::texts(self.page, selectors::HEADING)
                    .await
                    .into_iter()
                    .find(|text| !selectors::is_placeholder_heading(text)),
                NameSource::NameContainer => self.name_from_containers().await,
            };
            if let Some(name) = found {
                tracing::debug!(?source, name = %name, "business name resolved");
                return Some(name);
            }
        }
        None
    }

    async fn name_from_containers(&self) -> Option<String> {
        for selector in selectors::NAME_CONTAINERS {
            let found = lookup::texts(self.page, selector)
                .await
                .into_iter()
                .find(|text| text.chars().count() > 2 && !selectors::is_placeholder_heading(text));
            if found.is_some() {
                return found;
            }
        }
        None
    }

    async fn rating(&self) -> Option<f64> {
        for selector in selectors::RATING_LABELS {
            let labels = lookup::attributes(self.page, selector, "aria-label").await;
            if let Some(rating) = labels.iter().find_map(|l| parse::parse_rating_label(l)) {
                return Some(rating);
            }
        }
        lookup::texts(self.page, selectors::RATING_TEXT)
            .await
            .iter()
            .find_map(|t| parse::parse_rating_text(t))
    }

    async fn review_count(&self) -> Option<u64> {
        for selector in [selectors::REVIEW_COUNT_TEXT, selectors::REVIEW_BUTTONS] {
            let texts = lookup::texts(self.page, selector).await;
            if let Some(count) = texts.iter().find_map(|t| parse::parse_review_count(t)) {
                return Some(count);
            }
        }
        None
    }

    async fn phone(&self) -> Option<String> {
        if let Some(label) = lookup::first_attribute(self.page, selectors::PHONE, "aria-label").await
        {
            let phone = parse::strip_label_prefix(&label, &selectors::PHONE_PREFIXES);
            if !phone.is_empty() {
                return Some(phone);
            }
        }
        let text = self.page.inner_text(selectors::MAIN_PANEL).await.ok().flatten()?;
        parse::find_phone(&text)
    }

    async fn hours(&self) -> Option<String> {
        for selector in selectors::HOURS {
            if let Some(hours) = lookup::first_text(self.page, selector).await {
                return Some(hours);
            }
        }
        None
    }

    /// Age of the oldest visible review, as a stand-in for listing age.
    async fn oldest_review_age(&self) -> Option<u32> {
        lookup::texts(self.page, selectors::REVIEW_DATES)
            .await
            .iter()
            .filter_map(|t| parse::estimate_age_days(t))
            .max()
    }
}

/// First `·`-separated segment of a list item's label, unless it is a placeholder.
fn name_from_label(label: &str) -> Option<String> {
    let name = label.split(selectors::LABEL_SEPARATOR).next()?.trim();
    (!selectors::is_placeholder_heading(name)).then(|| name.to_string())
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
