use mapscout_core::BusinessRecord;
use serde::{Deserialize, Serialize};

/// Separator used to flatten the email set into one CSV cell.
pub const EMAIL_SEPARATOR: &str = "; ";

/// Flat CSV projection of a [`BusinessRecord`]. Column order is the header order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRow {
    pub name: String,
    pub phone: String,
    pub website: String,
    pub email: String,
    pub emails: String,
    pub address: String,
    pub category: String,
    pub hours: String,
    pub rating: f64,
    pub review_count: u64,
    pub department: String,
    pub province: String,
    pub district: String,
    pub search_query: String,
    pub age_days: Option<u32>,
    pub timestamp: String,
}

impl From<&BusinessRecord> for CsvRow {
    fn from(record: &BusinessRecord) -> Self {
        Self {
            name: record.name.clone(),
            phone: record.phone.clone(),
            website: record.website.clone(),
            email: record.email.clone(),
            emails: record.emails.join(EMAIL_SEPARATOR),
            address: record.address.clone(),
            category: record.category.clone(),
            hours: record.hours.clone(),
            rating: record.rating,
            review_count: record.review_count,
            department: record.department.clone(),
            province: record.province.clone(),
            district: record.district.clone(),
            search_query: record.search_query.clone(),
            age_days: record.age_days,
            timestamp: record.timestamp.to_rfc3339(),
        }
    }
}

impl CsvRow {
    /// Identity used when merging district files.
    #[must_use]
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.name, &self.address)
    }
}
