//! Quality filter applied to each search batch.

use crate::record::BusinessRecord;

/// Default upper bound on listing age: effectively "no limit".
pub const DEFAULT_MAX_AGE_DAYS: u32 = 36_500;

/// Inclusive thresholds a record must meet to be kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCriteria {
    pub min_rating: f64,
    pub min_reviews: u64,
    pub min_age_days: u32,
    pub max_age_days: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_rating: 0.0,
            min_reviews: 0,
            min_age_days: 0,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

impl FilterCriteria {
    /// Returns `true` if `record` meets every threshold.
    ///
    /// The age window only applies to records whose age was estimated.
    #[must_use]
    pub fn admits(&self, record: &BusinessRecord) -> bool {
        let age_ok = record
            .age_days
            .is_none_or(|age| (self.min_age_days..=self.max_age_days).contains(&age));
        record.rating >= self.min_rating && record.review_count >= self.min_reviews && age_ok
    }

    /// Stable filtering pass: survivors keep their extraction order.
    #[must_use]
    pub fn apply(&self, records: Vec<BusinessRecord>) -> Vec<BusinessRecord> {
        records.into_iter().filter(|r| self.admits(r)).collect()
    }
}
