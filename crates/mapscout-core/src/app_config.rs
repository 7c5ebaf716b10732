use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How the scraper spaces out page interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingMode {
    /// Randomized delays within each call site's window.
    Human,
    /// Zero delays. Only useful against local fixtures.
    None,
}

impl std::fmt::Display for PacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacingMode::Human => write!(f, "human"),
            PacingMode::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub output_dir: PathBuf,
    pub country: String,
    pub search_base_url: String,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub max_results: usize,
    pub skip_first: usize,
    pub max_scroll_attempts: u32,
    pub website_scan_probability: f64,
    pub website_timeout_secs: u64,
    pub pacing: PacingMode,
}
