use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::SinkError;

/// UTF-8 byte order mark, written ahead of CSV files spreadsheet tools open.
pub(crate) const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Csv,
    Json,
    #[default]
    Both,
}

impl OutputFormat {
    #[must_use]
    pub fn writes_csv(self) -> bool {
        matches!(self, Self::Csv | Self::Both)
    }

    #[must_use]
    pub fn writes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }

    /// Only the combined output carries a BOM on its CSV.
    #[must_use]
    pub fn csv_bom(self) -> bool {
        self == Self::Both
    }
}

impl FromStr for OutputFormat {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "both" => Ok(Self::Both),
            other => Err(SinkError::UnknownFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Both => write!(f, "both"),
        }
    }
}

/// When batches reach disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    /// After every batch.
    #[default]
    Incremental,
    /// Once, when the sink is finished.
    ///
    /// Nothing is on disk until then: if the process dies first, every
    /// result of the run is lost.
    Buffered,
}

/// `gmb_{query_with_underscores}_{YYYYmmdd_HHMMSS}`.
#[must_use]
pub fn default_stem(query: &str, at: NaiveDateTime) -> String {
    let query = query.split_whitespace().collect::<Vec<_>>().join("_");
    format!("gmb_{query}_{}", at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(" json ".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("both".parse::<OutputFormat>().unwrap(), OutputFormat::Both);
        assert!(matches!(
            "xlsx".parse::<OutputFormat>(),
            Err(SinkError::UnknownFormat(ref f)) if f == "xlsx"
        ));
    }

    #[test]
    fn bom_only_in_both_mode() {
        assert!(OutputFormat::Both.csv_bom());
        assert!(!OutputFormat::Csv.csv_bom());
        assert!(!OutputFormat::Json.writes_csv());
    }

    #[test]
    fn stem_joins_query_words_and_timestamp() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        assert_eq!(
            default_stem("  pollo a la brasa ", at),
            "gmb_pollo_a_la_brasa_20240309_140507"
        );
    }
}
