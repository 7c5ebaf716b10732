//! Result persistence: per-run CSV/JSON output and per-district CSV files.

pub mod district;
pub mod error;
pub mod format;
pub mod row;
pub mod sink;

pub use district::{DistrictExporter, DistrictReport};
pub use error::SinkError;
pub use format::{default_stem, OutputFormat, SaveMode};
pub use row::CsvRow;
pub use sink::{read_json, ResultSink};
