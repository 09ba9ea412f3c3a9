use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub profile_source_url: String,
    pub jobs_catalog_url: String,
    pub trainings_catalog_url: String,
    pub port: u16,
    pub rust_log: String,
    pub ranking: RankingSettings,
}

/// Tuning knobs for the parse-then-rank pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingSettings {
    pub jobs_threshold: f64,
    pub trainings_threshold: f64,
    /// Page size when results are shown unranked.
    pub page_size: u32,
    /// Page size when ranking is active; filtering shrinks pages, so more is fetched.
    pub filtered_page_size: u32,
    pub debounce: Duration,
    pub profile_timeout: Duration,
    /// The largest catalogs need the longest budget.
    pub catalog_timeout: Duration,
    /// Cached profiles and idle query slots older than this are dropped.
    pub session_ttl: Duration,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            jobs_threshold: 0.1,
            trainings_threshold: 0.15,
            page_size: 20,
            filtered_page_size: 100,
            debounce: Duration::from_millis(300),
            profile_timeout: Duration::from_secs(10),
            catalog_timeout: Duration::from_secs(25),
            session_ttl: Duration::from_secs(30 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = RankingSettings::default();
        let ranking = RankingSettings {
            jobs_threshold: optional_env("JOBS_THRESHOLD", defaults.jobs_threshold)?,
            trainings_threshold: optional_env(
                "TRAININGS_THRESHOLD",
                defaults.trainings_threshold,
            )?,
            page_size: optional_env("PAGE_SIZE", defaults.page_size)?,
            filtered_page_size: optional_env(
                "FILTERED_PAGE_SIZE",
                defaults.filtered_page_size,
            )?,
            debounce: Duration::from_millis(optional_env(
                "DEBOUNCE_MS",
                defaults.debounce.as_millis() as u64,
            )?),
            profile_timeout: Duration::from_secs(optional_env(
                "PROFILE_TIMEOUT_SECS",
                defaults.profile_timeout.as_secs(),
            )?),
            catalog_timeout: Duration::from_secs(optional_env(
                "CATALOG_TIMEOUT_SECS",
                defaults.catalog_timeout.as_secs(),
            )?),
            session_ttl: Duration::from_secs(optional_env(
                "SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )?),
        };

        Ok(Config {
            profile_source_url: require_env("PROFILE_SOURCE_URL")?,
            jobs_catalog_url: require_env("JOBS_CATALOG_URL")?,
            trainings_catalog_url: require_env("TRAININGS_CATALOG_URL")?,
            port: optional_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ranking,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ranking_settings() {
        let settings = RankingSettings::default();
        assert_eq!(settings.jobs_threshold, 0.1);
        assert_eq!(settings.trainings_threshold, 0.15);
        assert!(settings.filtered_page_size > settings.page_size);
        assert_eq!(settings.catalog_timeout, Duration::from_secs(25));
    }

    #[test]
    fn test_optional_env_default_and_parse_error() {
        assert_eq!(optional_env("RANKWISE_TEST_UNSET_KEY", 7u32).unwrap(), 7);

        std::env::set_var("RANKWISE_TEST_BAD_PORT", "not-a-port");
        assert!(optional_env("RANKWISE_TEST_BAD_PORT", 8080u16).is_err());
        std::env::remove_var("RANKWISE_TEST_BAD_PORT");
    }
}
