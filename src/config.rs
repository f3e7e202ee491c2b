//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::warn;

use crate::error::ConfigError;
use crate::personality::drift::MAX_REANALYSIS_DAYS;

/// Default lookback window for drift reanalysis.
pub const DEFAULT_REANALYSIS_DAYS: u32 = 30;

/// Service configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Oracle credential.
    pub api_key: SecretString,
    /// Oracle model name.
    pub model: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// HTTP listen port.
    pub port: u16,
    /// Default reanalysis window when the caller omits `days`.
    pub reanalysis_days: u32,
    /// Upper bound on a single oracle request.
    pub oracle_timeout: Duration,
    /// Optional JSON catalog imported at start-up.
    pub catalog_seed: Option<PathBuf>,
    /// Fixed seed for the recommender's random source.
    pub rng_seed: Option<u64>,
    /// Directory for daily-rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// Build the configuration from environment variables.
    ///
    /// Only `OPENAI_API_KEY` is required. Unparseable numbers, and a
    /// reanalysis window outside `1..=MAX_REANALYSIS_DAYS`, fall back to
    /// their defaults with a warning.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let model = std::env::var("CARE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
        let base_url = std::env::var("CARE_OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let db_path = std::env::var("CARE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/care-companion.db"));

        Ok(Self {
            api_key: SecretString::from(api_key),
            model,
            base_url,
            db_path,
            port: env_number("CARE_PORT", 8080),
            reanalysis_days: reanalysis_window(env_number(
                "CARE_REANALYSIS_DAYS",
                DEFAULT_REANALYSIS_DAYS,
            )),
            oracle_timeout: Duration::from_secs(env_number("CARE_ORACLE_TIMEOUT_SECS", 30)),
            catalog_seed: std::env::var("CARE_CATALOG_SEED").ok().map(PathBuf::from),
            rng_seed: std::env::var("CARE_RNG_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
            log_dir: log_dir_from_env(),
        })
    }
}

/// `CARE_LOG_DIR`, readable before the rest of the configuration so file
/// logging can be installed first.
pub fn log_dir_from_env() -> Option<PathBuf> {
    std::env::var_os("CARE_LOG_DIR").map(PathBuf::from)
}

/// Read a numeric variable, warning and falling back on bad input.
fn env_number<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_or_default(key, &raw, default),
        Err(_) => default,
    }
}

fn reanalysis_window(days: u32) -> u32 {
    if (1..=MAX_REANALYSIS_DAYS).contains(&days) {
        days
    } else {
        warn!(
            days,
            max = MAX_REANALYSIS_DAYS,
            default = DEFAULT_REANALYSIS_DAYS,
            "CARE_REANALYSIS_DAYS out of range, using default"
        );
        DEFAULT_REANALYSIS_DAYS
    }
}

fn parse_or_default<T>(key: &str, raw: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, value = raw, default = %default, "Invalid numeric config value, using default");
        default
    })
}
