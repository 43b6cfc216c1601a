//! Environment-driven server configuration.

use fathom_client::{DEFAULT_BASE_URL, DEFAULT_MAX_PAGES};
use fathom_protocol::OutputFormat;
use fathom_search::{DEFAULT_TRANSCRIPT_CONCURRENCY, MAX_TRANSCRIPT_CONCURRENCY};
use log::warn;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const MAX_PER_PAGE: u32 = 100;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PER_PAGE: u32 = 50;
const DEFAULT_SEARCH_DEADLINE_SECS: u64 = 60;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("FATHOM_API_KEY is not set")]
    MissingApiKey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub output_format: OutputFormat,
    pub default_per_page: u32,
    pub max_pages: usize,
    pub transcript_concurrency: usize,
    /// Upper bound on the transcript phase of one search.
    pub search_deadline: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unparsable numbers fall back to their defaults
    /// and out-of-range ones are clamped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("FATHOM_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let base_url = lookup("FATHOM_BASE_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let output_format = match lookup("OUTPUT_FORMAT") {
            None => OutputFormat::default(),
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!("OUTPUT_FORMAT: {err}; using toon");
                OutputFormat::default()
            }),
        };

        let timeout_secs = numeric(&lookup, "FATHOM_TIMEOUT", DEFAULT_TIMEOUT_SECS, 1, 300);
        let deadline_secs = numeric(
            &lookup,
            "FATHOM_SEARCH_DEADLINE",
            DEFAULT_SEARCH_DEADLINE_SECS,
            1,
            600,
        );

        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            output_format,
            default_per_page: numeric(&lookup, "DEFAULT_PER_PAGE", DEFAULT_PER_PAGE, 1, MAX_PER_PAGE),
            max_pages: numeric(&lookup, "FATHOM_MAX_PAGES", DEFAULT_MAX_PAGES, 1, 100),
            transcript_concurrency: numeric(
                &lookup,
                "FATHOM_TRANSCRIPT_CONCURRENCY",
                DEFAULT_TRANSCRIPT_CONCURRENCY,
                1,
                MAX_TRANSCRIPT_CONCURRENCY,
            ),
            search_deadline: Duration::from_secs(deadline_secs),
        })
    }
}

fn numeric<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T, min: T, max: T) -> T
where
    T: FromStr + Ord + Copy + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value.clamp(min, max),
        Err(_) => {
            warn!("{key}={raw:?} is not a valid number; using {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let cfg = config(&[("FATHOM_API_KEY", "secret")]).unwrap();
        assert_eq!(
            cfg,
            ServerConfig {
                api_key: "secret".to_string(),
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: Duration::from_secs(30),
                output_format: OutputFormat::Toon,
                default_per_page: 50,
                max_pages: 10,
                transcript_concurrency: 4,
                search_deadline: Duration::from_secs(60),
            }
        );
    }

    #[test]
    fn missing_or_blank_key_is_an_error() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::MissingApiKey);
        assert_eq!(
            config(&[("FATHOM_API_KEY", "  ")]).unwrap_err(),
            ConfigError::MissingApiKey
        );
    }

    #[test]
    fn values_are_parsed_clamped_or_defaulted() {
        let cfg = config(&[
            ("FATHOM_API_KEY", "k"),
            ("OUTPUT_FORMAT", "JSON"),
            ("FATHOM_TIMEOUT", " 5 "),
            ("DEFAULT_PER_PAGE", "5000"),
            ("FATHOM_MAX_PAGES", "lots"),
            ("FATHOM_TRANSCRIPT_CONCURRENCY", "0"),
            ("FATHOM_SEARCH_DEADLINE", "86400"),
        ])
        .unwrap();
        assert_eq!(cfg.output_format, OutputFormat::Json);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.default_per_page, MAX_PER_PAGE);
        assert_eq!(cfg.max_pages, 10);
        assert_eq!(cfg.transcript_concurrency, 1);
        assert_eq!(cfg.search_deadline, Duration::from_secs(600));
    }

    #[test]
    fn unknown_output_format_falls_back_to_toon() {
        let cfg = config(&[("FATHOM_API_KEY", "k"), ("OUTPUT_FORMAT", "yaml")]).unwrap();
        assert_eq!(cfg.output_format, OutputFormat::Toon);
    }
}
