use crate::app_config::{AppConfig, Environment, PacingMode};
use crate::ConfigError;

/// Website fetches never wait less than this, whatever the environment says.
const WEBSITE_TIMEOUT_FLOOR_SECS: u64 = 5;
/// Website fetches never wait longer than this.
const WEBSITE_TIMEOUT_CEILING_SECS: u64 = 10;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but its value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// configuration.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("MAPSCOUT_ENV", "development"))?;
    let log_level = or_default("MAPSCOUT_LOG_LEVEL", "info");
    let output_dir = PathBuf::from(or_default("MAPSCOUT_OUTPUT_DIR", "./output"));
    let country = or_default("MAPSCOUT_COUNTRY", "Perú");
    let search_base_url = or_default(
        "MAPSCOUT_SEARCH_BASE_URL",
        "https://www.google.com/maps/search/",
    );
    let headless = parse_bool("MAPSCOUT_HEADLESS", "true")?;
    let chrome_path = lookup("MAPSCOUT_CHROME_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let max_results = parse_usize("MAPSCOUT_MAX_RESULTS", "10")?;
    if max_results == 0 {
        return Err(invalid(
            "MAPSCOUT_MAX_RESULTS",
            "must be at least 1".to_string(),
        ));
    }
    let skip_first = parse_usize("MAPSCOUT_SKIP_FIRST", "0")?;
    let max_scroll_attempts = parse_u32("MAPSCOUT_MAX_SCROLL_ATTEMPTS", "5")?;

    let website_scan_probability = or_default("MAPSCOUT_WEBSITE_SCAN_PROBABILITY", "0.5")
        .parse::<f64>()
        .map_err(|e| invalid("MAPSCOUT_WEBSITE_SCAN_PROBABILITY", e.to_string()))?;
    if !(0.0..=1.0).contains(&website_scan_probability) {
        return Err(invalid(
            "MAPSCOUT_WEBSITE_SCAN_PROBABILITY",
            format!("{website_scan_probability} is outside 0.0..=1.0"),
        ));
    }

    let website_timeout_secs = parse_u64("MAPSCOUT_WEBSITE_TIMEOUT_SECS", "8")?
        .clamp(WEBSITE_TIMEOUT_FLOOR_SECS, WEBSITE_TIMEOUT_CEILING_SECS);

    let pacing = parse_pacing(&or_default("MAPSCOUT_PACING", "human"))?;
    if env == Environment::Production && pacing == PacingMode::None {
        return Err(invalid(
            "MAPSCOUT_PACING",
            "zero-delay pacing is not allowed in production".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        output_dir,
        country,
        search_base_url,
        headless,
        chrome_path,
        max_results,
        skip_first,
        max_scroll_attempts,
        website_scan_probability,
        website_timeout_secs,
        pacing,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MAPSCOUT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_pacing(s: &str) -> Result<PacingMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "human" => Ok(PacingMode::Human),
        "none" | "off" => Ok(PacingMode::None),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MAPSCOUT_PACING".to_string(),
            reason: format!("expected 'human' or 'none', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
