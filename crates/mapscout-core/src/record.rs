//! Business listing records and the location they were searched in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::EmailSet;

/// Sentinel written for any text field that could not be resolved.
pub const UNKNOWN: &str = "N/A";

const MAX_RATING: f64 = 5.0;

/// One `(department, province, district)` triple from the location hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchLocation {
    pub department: String,
    pub province: String,
    pub district: String,
}

impl SearchLocation {
    #[must_use]
    pub fn new(
        department: impl Into<String>,
        province: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        Self {
            department: department.into(),
            province: province.into(),
            district: district.into(),
        }
    }

    /// Human-readable `"district, province, department"` label used in
    /// search queries and logs.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}, {}, {}", self.district, self.province, self.department)
    }
}

impl std::fmt::Display for SearchLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Raw fields pulled from one detail view, before location metadata is
/// attached. `None` means the field's fallback chain found nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFields {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub hours: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub emails: EmailSet,
    /// Approximate age in days, when review dates were inspected.
    pub age_days: Option<u32>,
}

/// A fully assembled business listing, ready for export.
///
/// Construct with [`BusinessRecord::assemble`]; there is no way to build a
/// record without a resolved name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    pub category: String,
    pub hours: String,
    pub rating: f64,
    pub review_count: u64,
    /// Primary email (first encountered) or [`UNKNOWN`].
    pub email: String,
    #[serde(default)]
    pub emails: Vec<String>,
    pub department: String,
    pub province: String,
    pub district: String,
    pub search_query: String,
    #[serde(default)]
    pub age_days: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl BusinessRecord {
    /// Builds a record from extracted fields plus search metadata.
    ///
    /// Returns `None` when no usable name was resolved; such a listing means
    /// the detail view never actually opened. Ratings are clamped into
    /// `0.0..=5.0` and non-finite ratings become `0.0`.
    #[must_use]
    pub fn assemble(fields: ListingFields, location: &SearchLocation, query: &str) -> Option<Self> {
        let name = fields
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && n != UNKNOWN)?;

        let rating = fields
            .rating
            .filter(|r| r.is_finite())
            .map_or(0.0, |r| r.clamp(0.0, MAX_RATING));

        let email = fields.emails.primary().unwrap_or(UNKNOWN).to_string();

        Some(Self {
            name,
            phone: or_unknown(fields.phone),
            website: or_unknown(fields.website),
            address: or_unknown(fields.address),
            category: or_unknown(fields.category),
            hours: or_unknown(fields.hours),
            rating,
            review_count: fields.review_count.unwrap_or(0),
            email,
            emails: fields.emails.into_vec(),
            department: location.department.clone(),
            province: location.province.clone(),
            district: location.district.clone(),
            search_query: query.to_string(),
            age_days: fields.age_days,
            timestamp: Utc::now(),
        })
    }

    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email != UNKNOWN
    }

    #[must_use]
    pub fn location(&self) -> SearchLocation {
        SearchLocation::new(&self.department, &self.province, &self.district)
    }
}

fn or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
