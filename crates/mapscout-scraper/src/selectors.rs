//! CSS selectors and label vocabularies for the map listing pages.
//!
//! Labels are matched in both English and Spanish; the interface language
//! follows the browser locale.

/// Result-list item selectors, most reliable first.
pub const LIST_ITEMS: [&str; 2] = [r#"a[href*="/maps/place/"]"#, r#"div[class*="Nv2PK"]"#];

/// Scrollable result feed.
pub const FEED: &str = r#"div[role="feed"]"#;

pub const BACK_CONTROLS: [&str; 5] = [
    r#"button[aria-label*="Back"]"#,
    r#"button[aria-label*="back"]"#,
    r#"button[aria-label*="Atrás"]"#,
    r#"button[aria-label*="Volver"]"#,
    r#"button[jsaction*="back"]"#,
];

pub const HEADING: &str = "h1";

/// Headings shown while the list (not a business) is on screen.
pub const PLACEHOLDER_HEADINGS: [&str; 4] =
    ["Results", "Resultados", "Search results", "Buscar en Google Maps"];

/// Controls that only exist on a business detail view.
pub const DETAIL_ACTIONS: [&str; 4] = [
    r#"button[data-item-id*="phone"]"#,
    r#"button[data-item-id="address"]"#,
    r#"button[data-tooltip*="phone"]"#,
    r#"button[data-tooltip*="Phone"]"#,
];

pub const NAME_CONTAINERS: [&str; 4] = [
    r#"div[class*="fontHeadlineLarge"]"#,
    r#"div[class*="DUwDvf"]"#,
    r#"div[role="heading"][aria-level="1"]"#,
    r#"h1[class*="DUwDvf"]"#,
];

/// Separator between name, rating and category in a list item's label.
pub const LABEL_SEPARATOR: char = '·';

pub const RATING_LABELS: [&str; 2] = [
    r#"span[aria-label*="star"]"#,
    r#"span[aria-label*="estrella"]"#,
];
pub const RATING_TEXT: &str = "span.MW4etd";

pub const REVIEW_COUNT_TEXT: &str = "span.UY7F9";
pub const REVIEW_BUTTONS: &str = r#"button[jsaction*="review"]"#;

pub const ADDRESS: &str = r#"button[data-item-id="address"]"#;
pub const ADDRESS_PREFIXES: [&str; 2] = ["Address:", "Dirección:"];

pub const PHONE: &str = r#"button[data-item-id*="phone"]"#;
pub const PHONE_PREFIXES: [&str; 2] = ["Phone:", "Teléfono:"];

pub const WEBSITE: &str = r#"a[data-item-id="authority"]"#;
pub const CATEGORY: &str = r#"button[jsaction*="category"]"#;
pub const HOURS: [&str; 2] = [r#"div[aria-label*="hours"]"#, r#"div[aria-label*="horario"]"#];

/// Main detail panel, scanned for phone numbers when the phone button is missing.
pub const MAIN_PANEL: &str = r#"div[role="main"]"#;
pub const BODY: &str = "body";
pub const MAILTO_LINKS: &str = r#"a[href^="mailto:"]"#;

/// Relative dates on visible reviews ("hace 2 años", "3 weeks ago").
pub const REVIEW_DATES: &str = "span.rsqaWe";

pub const CONSENT_BUTTONS: &str = "button";
pub const CONSENT_LABELS: [&str; 2] = ["Accept", "Aceptar"];

#[must_use]
pub fn is_placeholder_heading(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || PLACEHOLDER_HEADINGS.contains(&text)
}
