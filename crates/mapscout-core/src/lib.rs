pub mod app_config;
pub mod config;
pub mod email;
pub mod filter;
pub mod hierarchy;
pub mod record;

pub use app_config::{AppConfig, Environment, PacingMode};
pub use config::{load_app_config, load_app_config_from_env};
pub use email::{is_generic_domain, is_valid_email, EmailSet};
pub use filter::FilterCriteria;
pub use hierarchy::{LocationHierarchy, LocationSelection};
pub use record::{BusinessRecord, ListingFields, SearchLocation, UNKNOWN};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read location file {path}: {source}")]
    LocationFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse location file: {0}")]
    LocationFileParse(#[from] serde_yaml::Error),

    #[error("location hierarchy validation failed: {0}")]
    Validation(String),
}

/// Lookup failures against the department → province → district hierarchy.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("unknown department: {0}")]
    DepartmentNotFound(String),

    #[error("unknown province '{province}' in department '{department}'")]
    ProvinceNotFound {
        department: String,
        province: String,
    },

    #[error("unknown district '{0}' in the selected provinces")]
    DistrictNotFound(String),

    #[error("no locations selected")]
    NothingSelected,
}
