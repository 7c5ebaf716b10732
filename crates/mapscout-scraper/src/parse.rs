//! Text parsers for the values scraped out of a detail view.

use std::sync::LazyLock;

use regex::Regex;

static RATING_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:stars?|estrellas?)").expect("valid rating regex")
});
static PARENTHESIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("valid parentheses regex"));
static COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d.,]*)\s*(?:([km])\b)?").expect("valid count regex")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+51\s?)?(?:\d{1,2}\s?)?\d{3}[\s-]?\d{3}[\s-]?\d{3,4}")
        .expect("valid phone regex")
});
static RELATIVE_AGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?:hace\s+(?P<es_n>\d+|un|una)\s+(?P<es_unit>año|años|mes|meses|semana|semanas|día|días|dia|dias))
        |
        (?:(?P<en_n>\d+|a|an)\s+(?P<en_unit>years?|months?|weeks?|days?)\s+ago)",
    )
    .expect("valid relative age regex")
});

const MAX_RATING: f64 = 5.0;

/// Rating from an accessible label such as `"4.5 stars"` or `"4,3 estrellas"`.
///
/// Values outside `0.0..=5.0` are rejected.
#[must_use]
pub fn parse_rating_label(label: &str) -> Option<f64> {
    let caps = RATING_LABEL_RE.captures(label)?;
    let value = parse_decimal(caps.get(1)?.as_str())?;
    (0.0..=MAX_RATING).contains(&value).then_some(value)
}

/// Rating from a bare number such as `"4.7"`. Only `0 < value <= 5` counts.
#[must_use]
pub fn parse_rating_text(text: &str) -> Option<f64> {
    let value = parse_decimal(text.trim())?;
    (value > 0.0 && value <= MAX_RATING).then_some(value)
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Review count from text like `"(1,234)"`, `"1.2K reviews"` or `"(3M)"`.
///
/// A parenthesized group is preferred when present. Thousand separators
/// (`,` or `.`) are ignored; a `K`/`M` suffix multiplies by 1 000 / 1 000 000,
/// in which case the separator is read as a decimal point.
#[must_use]
pub fn parse_review_count(text: &str) -> Option<u64> {
    let inner = PARENTHESIZED_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str());

    let caps = COUNT_RE.captures(inner)?;
    let digits = caps.get(1)?.as_str().trim_end_matches(['.', ',']);
    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(suffix) if suffix == "k" => 1_000.0,
        Some(suffix) if suffix == "m" => 1_000_000.0,
        _ => return digits.replace([',', '.'], "").parse::<u64>().ok(),
    };

    let value = parse_decimal(digits)? * multiplier;
    // Digits only, so never negative; rounding removes float noise such as 1199.9999.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(value.round() as u64)
}

/// Removes the first matching label prefix (`"Phone: "`, `"Dirección: "`).
#[must_use]
pub fn strip_label_prefix(label: &str, prefixes: &[&str]) -> String {
    let trimmed = label.trim();
    prefixes
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// First Peru-style phone number in free text.
#[must_use]
pub fn find_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().trim().to_string())
}

/// Approximate age in days from a relative date.
///
/// Understands `"hace 2 años"`, `"hace un mes"`, `"3 weeks ago"`,
/// `"a year ago"`. A month is 30 days and a year 365.
#[must_use]
pub fn estimate_age_days(text: &str) -> Option<u32> {
    let caps = RELATIVE_AGE_RE.captures(text)?;
    let (count, unit) = match (caps.name("es_n"), caps.name("es_unit")) {
        (Some(n), Some(unit)) => (n.as_str(), unit.as_str()),
        _ => (caps.name("en_n")?.as_str(), caps.name("en_unit")?.as_str()),
    };

    let count: u32 = match count.to_lowercase().as_str() {
        "un" | "una" | "a" | "an" => 1,
        digits => digits.parse().ok()?,
    };
    let unit = unit.to_lowercase();
    let days_per_unit = if unit.starts_with("año") || unit.starts_with("year") {
        365
    } else if unit.starts_with("mes") || unit.starts_with("month") {
        30
    } else if unit.starts_with("semana") || unit.starts_with("week") {
        7
    } else {
        1
    };
    count.checked_mul(days_per_unit)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
