//! Scriptable in-memory [`MapPage`] for tests.
//!
//! Models the list view / detail view transitions of a map search page:
//! clicking an item opens its detail view and re-renders the page (every
//! handle taken before the click goes stale), the back control and history
//! navigation return to the list, and the feed reveals more items per scroll.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::BrowserError;
use crate::page::MapPage;
use crate::selectors;

/// What a listing's detail view renders. `None`/empty fields are absent.
#[derive(Debug, Clone, Default)]
pub struct FakeDetail {
    pub back_control: bool,
    pub heading: Option<String>,
    pub name_container: Option<String>,
    pub rating_label: Option<String>,
    pub rating_text: Option<String>,
    pub review_count_text: Option<String>,
    pub address_label: Option<String>,
    pub phone_label: Option<String>,
    pub website: Option<String>,
    pub category: Option<String>,
    pub hours: Option<String>,
    pub main_text: Option<String>,
    pub body_text: Option<String>,
    pub mailto: Vec<String>,
    pub review_dates: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeListing {
    /// The list item's `aria-label`.
    pub label: Option<String>,
    pub detail: FakeDetail,
}

impl FakeListing {
    /// A listing whose label and heading carry `name`, with a back control.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            label: Some(format!("{name} · 4,5 estrellas")),
            detail: FakeDetail {
                back_control: true,
                heading: Some(name.to_string()),
                ..FakeDetail::default()
            },
        }
    }

    #[must_use]
    pub fn with_detail(mut self, edit: impl FnOnce(&mut FakeDetail)) -> Self {
        edit(&mut self.detail);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeView {
    Blank,
    List,
    Detail(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    ListItem(usize),
    BackControl,
    Consent,
    Inert,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    generation: u64,
    kind: Kind,
    text: Option<String>,
    attributes: Vec<(&'static str, String)>,
}

impl FakeElement {
    fn new(generation: u64, kind: Kind) -> Self {
        Self {
            generation,
            kind,
            text: None,
            attributes: Vec::new(),
        }
    }

    fn text(mut self, text: Option<&String>) -> Self {
        self.text = text.cloned();
        self
    }

    fn attr(mut self, name: &'static str, value: Option<&String>) -> Self {
        if let Some(value) = value {
            self.attributes.push((name, value.clone()));
        }
        self
    }
}

/// Callback run with the listing index each time a detail view opens.
#[derive(Default)]
struct OpenHook(Option<Box<dyn Fn(usize) + Send + Sync>>);

impl std::fmt::Debug for OpenHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.0.is_some() { "OpenHook(set)" } else { "OpenHook(none)" })
    }
}

#[derive(Debug, Default)]
struct State {
    view: Option<FakeView>,
    listings: Vec<FakeListing>,
    initial_visible: usize,
    visible: usize,
    page_size: usize,
    generation: u64,
    card_fallback: bool,
    no_list: bool,
    consent_pending: bool,
    consent_dismissed: bool,
    goto_fails: bool,
    click_fails: HashSet<usize>,
    script_click_fails: HashSet<usize>,
    shrink_after_open: Option<usize>,
    close_after_opens: Option<usize>,
    on_open: OpenHook,
    closed: bool,
    opened: Vec<usize>,
    back_clicks: usize,
    history_backs: usize,
    scrolls: usize,
    close_calls: usize,
    visited: Vec<String>,
}

impl State {
    fn view(&self) -> FakeView {
        self.view.unwrap_or(FakeView::Blank)
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn ensure_fresh(&self, element: &FakeElement) -> Result<(), BrowserError> {
        self.ensure_open()?;
        if element.generation == self.generation {
            Ok(())
        } else {
            Err(BrowserError::StaleElement)
        }
    }

    fn rerender(&mut self) {
        self.generation += 1;
    }

    fn item_selector(&self) -> &'static str {
        if self.card_fallback {
            selectors::LIST_ITEMS[1]
        } else {
            selectors::LIST_ITEMS[0]
        }
    }

    fn elements_for(&self, selector: &str) -> Vec<FakeElement> {
        let generation = self.generation;
        match self.view() {
            FakeView::Blank => Vec::new(),
            FakeView::List => {
                if !self.no_list && selector == self.item_selector() {
                    return self.listings[..self.visible]
                        .iter()
                        .enumerate()
                        .map(|(i, listing)| {
                            FakeElement::new(generation, Kind::ListItem(i))
                                .text(listing.label.as_ref())
                                .attr("aria-label", listing.label.as_ref())
                        })
                        .collect();
                }
                if selector == selectors::HEADING {
                    return vec![FakeElement::new(generation, Kind::Inert)
                        .text(Some(&"Resultados".to_string()))];
                }
                if selector == selectors::FEED && !self.no_list {
                    return vec![FakeElement::new(generation, Kind::Inert)];
                }
                if selector == selectors::CONSENT_BUTTONS && self.consent_pending {
                    return vec![
                        FakeElement::new(generation, Kind::Inert)
                            .text(Some(&"Rechazar todo".to_string())),
                        FakeElement::new(generation, Kind::Consent)
                            .text(Some(&"Aceptar todo".to_string())),
                    ];
                }
                Vec::new()
            }
            FakeView::Detail(index) => {
                let d = &self.listings[index].detail;
                let one = |kind: Kind| vec![FakeElement::new(generation, kind)];
                let inert = || FakeElement::new(generation, Kind::Inert);

                if selector == selectors::BACK_CONTROLS[0] && d.back_control {
                    one(Kind::BackControl)
                } else if selector == selectors::HEADING {
                    d.heading.iter().map(|h| inert().text(Some(h))).collect()
                } else if selector == selectors::NAME_CONTAINERS[0] {
                    d.name_container.iter().map(|n| inert().text(Some(n))).collect()
                } else if selector == selectors::RATING_LABELS[0] {
                    d.rating_label
                        .iter()
                        .map(|l| inert().attr("aria-label", Some(l)))
                        .collect()
                } else if selector == selectors::RATING_TEXT {
                    d.rating_text.iter().map(|t| inert().text(Some(t))).collect()
                } else if selector == selectors::REVIEW_COUNT_TEXT {
                    d.review_count_text.iter().map(|t| inert().text(Some(t))).collect()
                } else if selector == selectors::ADDRESS {
                    d.address_label
                        .iter()
                        .map(|l| inert().attr("aria-label", Some(l)))
                        .collect()
                } else if selector == selectors::PHONE {
                    d.phone_label
                        .iter()
                        .map(|l| inert().attr("aria-label", Some(l)))
                        .collect()
                } else if selector == selectors::WEBSITE {
                    d.website.iter().map(|w| inert().attr("href", Some(w))).collect()
                } else if selector == selectors::CATEGORY {
                    d.category.iter().map(|c| inert().text(Some(c))).collect()
                } else if selector == selectors::HOURS[0] {
                    d.hours.iter().map(|h| inert().text(Some(h))).collect()
                } else if selector == selectors::MAILTO_LINKS {
                    d.mailto
                        .iter()
                        .map(|m| inert().attr("href", Some(&format!("mailto:{m}"))))
                        .collect()
                } else if selector == selectors::REVIEW_DATES {
                    d.review_dates.iter().map(|r| inert().text(Some(r))).collect()
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn open(&mut self, index: usize) {
        self.view = Some(FakeView::Detail(index));
        self.rerender();
        self.opened.push(index);
        if let Some(len) = self.shrink_after_open.take() {
            self.visible = self.visible.min(len);
        }
        if self.close_after_opens == Some(self.opened.len()) {
            self.closed = true;
        }
        if let Some(hook) = &self.on_open.0 {
            hook(index);
        }
    }

    fn activate(&mut self, element: &FakeElement, scripted: bool) -> Result<(), BrowserError> {
        self.ensure_fresh(element)?;
        match element.kind {
            Kind::ListItem(index) => {
                let fails = if scripted {
                    &self.script_click_fails
                } else {
                    &self.click_fails
                };
                if fails.contains(&index) {
                    return Err(BrowserError::Interaction {
                        action: if scripted { "script click" } else { "click" },
                        reason: format!("item {index} is not clickable"),
                    });
                }
                self.open(index);
            }
            Kind::BackControl => {
                self.back_clicks += 1;
                self.view = Some(FakeView::List);
                self.rerender();
            }
            Kind::Consent => {
                self.consent_pending = false;
                self.consent_dismissed = true;
                self.rerender();
            }
            Kind::Inert => {}
        }
        Ok(())
    }
}

/// In-memory page. See the module docs for the behavior it models.
#[derive(Debug, Default)]
pub struct FakePage {
    state: Mutex<State>,
}

impl FakePage {
    /// A page already showing the list view with every listing visible.
    #[must_use]
    pub fn new(listings: Vec<FakeListing>) -> Self {
        let len = listings.len();
        Self {
            state: Mutex::new(State {
                view: Some(FakeView::List),
                listings,
                initial_visible: len,
                visible: len,
                page_size: len.max(1),
                ..State::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Only `initial` items are rendered after load; each feed scroll adds
    /// `per_scroll` more.
    #[must_use]
    pub fn paged(self, initial: usize, per_scroll: usize) -> Self {
        {
            let mut state = self.state();
            state.initial_visible = initial.min(state.listings.len());
            state.visible = state.initial_visible;
            state.page_size = per_scroll;
        }
        self
    }

    /// List items only match the fallback card selector.
    #[must_use]
    pub fn card_items(self) -> Self {
        self.state().card_fallback = true;
        self
    }

    /// The page loads but never shows a result list.
    #[must_use]
    pub fn without_list(self) -> Self {
        self.state().no_list = true;
        self
    }

    #[must_use]
    pub fn with_consent(self) -> Self {
        self.state().consent_pending = true;
        self
    }

    #[must_use]
    pub fn failing_navigation(self) -> Self {
        self.state().goto_fails = true;
        self
    }

    /// Element-level clicks on item `index` fail; script clicks still work.
    #[must_use]
    pub fn failing_click(self, index: usize) -> Self {
        self.state().click_fails.insert(index);
        self
    }

    /// Both click strategies fail on item `index`.
    #[must_use]
    pub fn unclickable(self, index: usize) -> Self {
        {
            let mut state = self.state();
            state.click_fails.insert(index);
            state.script_click_fails.insert(index);
        }
        self
    }

    /// After the first detail view opens, the list re-renders with only
    /// `len` items.
    #[must_use]
    pub fn shrinking_to(self, len: usize) -> Self {
        self.state().shrink_after_open = Some(len);
        self
    }

    /// The session dies right after the `opens`-th detail view opens.
    #[must_use]
    pub fn closing_after(self, opens: usize) -> Self {
        self.state().close_after_opens = Some(opens);
        self
    }

    /// Runs `hook` with the listing index whenever a detail view opens.
    /// The hook runs while the page is locked and must not call back into it.
    #[must_use]
    pub fn on_open(self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.state().on_open = OpenHook(Some(Box::new(hook)));
        self
    }

    /// Jumps straight to a listing's detail view.
    pub fn open_detail(&self, index: usize) {
        self.state().open(index);
    }

    #[must_use]
    pub fn view(&self) -> FakeView {
        self.state().view()
    }

    /// Indices of every detail view opened, in order.
    #[must_use]
    pub fn opened(&self) -> Vec<usize> {
        self.state().opened.clone()
    }

    #[must_use]
    pub fn back_clicks(&self) -> usize {
        self.state().back_clicks
    }

    #[must_use]
    pub fn history_backs(&self) -> usize {
        self.state().history_backs
    }

    #[must_use]
    pub fn scrolls(&self) -> usize {
        self.state().scrolls
    }

    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.state().close_calls
    }

    #[must_use]
    pub fn consent_dismissed(&self) -> bool {
        self.state().consent_dismissed
    }

    #[must_use]
    pub fn visited_urls(&self) -> Vec<String> {
        self.state().visited.clone()
    }
}

impl MapPage for FakePage {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.state();
        state.ensure_open()?;
        state.visited.push(url.to_string());
        if state.goto_fails {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        state.view = Some(FakeView::List);
        state.visible = state.initial_visible;
        state.rerender();
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<FakeElement>, BrowserError> {
        let state = self.state();
        state.ensure_open()?;
        Ok(state.elements_for(selector))
    }

    async fn text_of(&self, element: &FakeElement) -> Result<Option<String>, BrowserError> {
        self.state().ensure_fresh(element)?;
        Ok(element.text.clone())
    }

    async fn attribute_of(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.state().ensure_fresh(element)?;
        Ok(element
            .attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone()))
    }

    async fn scroll_into_view(&self, element: &FakeElement) -> Result<(), BrowserError> {
        self.state().ensure_fresh(element)
    }

    async fn click(&self, element: &FakeElement) -> Result<(), BrowserError> {
        self.state().activate(element, false)
    }

    async fn script_click(&self, element: &FakeElement) -> Result<(), BrowserError> {
        self.state().activate(element, true)
    }

    async fn scroll_feed(&self, selector: &str) -> Result<Option<u64>, BrowserError> {
        let mut state = self.state();
        state.ensure_open()?;
        if state.view() != FakeView::List || state.no_list || selector != selectors::FEED {
            return Ok(None);
        }
        state.scrolls += 1;
        state.visible = (state.visible + state.page_size).min(state.listings.len());
        Ok(Some(state.visible as u64 * 100))
    }

    async fn inner_text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let state = self.state();
        state.ensure_open()?;
        Ok(match state.view() {
            FakeView::Detail(index) => {
                let detail = &state.listings[index].detail;
                if selector == selectors::BODY {
                    detail.body_text.clone()
                } else if selector == selectors::MAIN_PANEL {
                    detail.main_text.clone()
                } else {
                    None
                }
            }
            FakeView::List if selector == selectors::BODY => Some("Resultados".to_string()),
            _ => None,
        })
    }

    async fn history_back(&self) -> Result<(), BrowserError> {
        let mut state = self.state();
        state.ensure_open()?;
        state.history_backs += 1;
        state.view = Some(match state.view() {
            FakeView::Detail(_) => FakeView::List,
            FakeView::List | FakeView::Blank => FakeView::Blank,
        });
        state.rerender();
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool, BrowserError> {
        let state = self.state();
        state.ensure_open()?;
        Ok(!state.elements_for(selector).is_empty())
    }

    fn is_closed(&self) -> bool {
        self.state().closed
    }

    async fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        state.close_calls += 1;
    }
}
