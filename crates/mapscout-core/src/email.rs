//! Email validation and the deduplicated address set carried by a record.

use std::sync::LazyLock;

use regex::Regex;

static VALID_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").expect("valid email regex")
});

/// Domains that only ever show up as template or placeholder addresses.
const GENERIC_DOMAINS: [&str; 6] = [
    "example.com",
    "email.com",
    "test.com",
    "domain.com",
    "yoursite.com",
    "website.com",
];

/// Returns `true` when `email` is syntactically acceptable.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    VALID_EMAIL.is_match(email)
}

/// Returns `true` when the address belongs to a known placeholder domain.
#[must_use]
pub fn is_generic_domain(email: &str) -> bool {
    email.rsplit_once('@').is_some_and(|(_, domain)| {
        let domain = domain.to_ascii_lowercase();
        GENERIC_DOMAINS.contains(&domain.as_str())
    })
}

/// Insertion-ordered, case-insensitively deduplicated set of validated emails.
///
/// Only addresses that pass [`is_valid_email`] and are not on a generic
/// domain are ever stored, so every member is safe to export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSet {
    emails: Vec<String>,
}

impl EmailSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a candidate address after trimming surrounding punctuation.
    ///
    /// Returns `true` if the address was new and accepted.
    pub fn insert(&mut self, candidate: &str) -> bool {
        let cleaned = candidate
            .trim()
            .trim_start_matches("mailto:")
            .split('?')
            .next()
            .unwrap_or_default()
            .trim_matches(|c: char| c == '.' || c == ',' || c == ';' || c.is_whitespace());

        if !is_valid_email(cleaned) || is_generic_domain(cleaned) {
            return false;
        }
        if self
            .emails
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(cleaned))
        {
            return false;
        }
        self.emails.push(cleaned.to_string());
        true
    }

    /// Set union; keeps the receiver's order and appends unseen addresses.
    pub fn merge(&mut self, other: EmailSet) {
        for email in other.emails {
            self.insert(&email);
        }
    }

    /// The first address encountered, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.emails
    }
}

impl<'a> FromIterator<&'a str> for EmailSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = EmailSet::new();
        for email in iter {
            set.insert(email);
        }
        set
    }
}
