//! Email discovery from the detail view and, optionally, the business website.

use std::sync::LazyLock;
use std::time::Duration;

use mapscout_core::EmailSet;
use regex::Regex;
use scraper::{Html, Selector};

use crate::error::ScraperError;
use crate::page::{lookup, MapPage};
use crate::pacing::{self, Pacing};
use crate::selectors;
use crate::user_agent;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Elements whose text is code, not content.
const NON_CONTENT_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Substrings of an href that mark a contact page.
const CONTACT_MARKERS: [&str; 4] = ["contact", "contacto", "contáctenos", "contactenos"];

const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 10;

/// Collects validated, non-generic email addresses for one business.
pub struct EmailHarvester {
    client: reqwest::Client,
    scan_probability: f64,
}

impl EmailHarvester {
    /// Builds the website client. `timeout_secs` is clamped to 5–10 s.
    ///
    /// Certificate validation is disabled: business websites routinely serve
    /// broken chains and must not block extraction.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, scan_probability: f64) -> Result<Self, ScraperError> {
        let timeout = timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(timeout))
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            scan_probability: scan_probability.clamp(0.0, 1.0),
        })
    }

    /// Page scan always; website scan with the configured probability when a
    /// website is known. Never fails.
    pub async fn harvest<P: MapPage>(
        &self,
        page: &P,
        website: Option<&str>,
        pacing: &dyn Pacing,
    ) -> EmailSet {
        let mut emails = scan_page(page).await;

        if let Some(url) = website {
            if pacing.chance(self.scan_probability) {
                pacing::pause(pacing, pacing::WEBSITE).await;
                let found = self.scan_website(url, user_agent::pick(pacing)).await;
                tracing::debug!(url, found = found.len(), "website scanned for emails");
                emails.merge(found);
            }
        }
        emails
    }

    /// Fetches `url` and extracts emails from its text and `mailto:` links.
    /// If none are found, follows the first contact-looking link once.
    ///
    /// Every failure (timeout, DNS, non-2xx) yields an empty set.
    pub async fn scan_website(&self, url: &str, user_agent: &str) -> EmailSet {
        let Some(body) = self.fetch(url, user_agent).await else {
            return EmailSet::new();
        };
        let emails = emails_in_html(&body);
        if !emails.is_empty() {
            return emails;
        }

        let Some(contact_url) = find_contact_link(url, &body) else {
            return emails;
        };
        tracing::debug!(url = %contact_url, "following contact link");
        match self.fetch(&contact_url, user_agent).await {
            Some(body) => emails_in_html(&body),
            None => emails,
        }
    }

    async fn fetch(&self, url: &str, user_agent: &str) -> Option<String> {
        let response = match self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(url, error = %err, "website fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(url, status = response.status().as_u16(), "website returned non-success");
            return None;
        }
        response.text().await.ok()
    }
}

/// Emails in the detail view's visible text and `mailto:` links.
pub async fn scan_page<P: MapPage>(page: &P) -> EmailSet {
    let mut emails = EmailSet::new();
    if let Ok(Some(text)) = page.inner_text(selectors::BODY).await {
        for m in EMAIL_RE.find_iter(&text) {
            emails.insert(m.as_str());
        }
    }
    for href in lookup::attributes(page, selectors::MAILTO_LINKS, "href").await {
        emails.insert(&href);
    }
    emails
}

/// Emails in an HTML document's text content and `mailto:` hrefs.
///
/// Only text nodes are scanned, so attribute values such as `logo@2x.png`
/// are not mistaken for addresses. Character references (`&#64;`,
/// `&commat;`) are decoded by the parser.
#[must_use]
pub fn emails_in_html(html: &str) -> EmailSet {
    let document = Html::parse_document(html);
    let mut emails = EmailSet::new();

    let text = content_text(&document);
    for m in EMAIL_RE.find_iter(&text) {
        emails.insert(m.as_str());
    }

    for href in anchor_hrefs(&document) {
        if href.to_ascii_lowercase().starts_with("mailto:") {
            emails.insert(&href);
        }
    }
    emails
}

fn content_text(document: &Html) -> String {
    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let in_code = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name().to_ascii_lowercase()))
            .is_some_and(|name| NON_CONTENT_TAGS.contains(&name.as_str()));
        if !in_code {
            text.push_str(fragment);
            text.push(' ');
        }
    }
    text
}

fn anchor_hrefs(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

fn find_contact_link(base_url: &str, html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    anchor_hrefs(&document)
        .into_iter()
        .filter(|href| {
            let lower = href.to_lowercase();
            !lower.starts_with("mailto:") && CONTACT_MARKERS.iter().any(|m| lower.contains(m))
        })
        .find_map(|href| absolutize_url(base_url, &href))
}

fn absolutize_url(base_url: &str, candidate: &str) -> Option<String> {
    let base = reqwest::Url::parse(base_url).ok()?;
    let url = base.join(candidate).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
