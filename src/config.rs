use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::criteria::PageSize;
use crate::retrieval::{clamp_threshold, LiveSearchDefaults, DEFAULT_THRESHOLD};
use crate::session::SessionSettings;

const API_URL_ENV: &str = "JOBSCOUT_API_URL";
const TOKEN_ENV: &str = "JOBSCOUT_TOKEN";

/// Settings read from `config.toml`; every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub country: String,
    pub live_search_cap: usize,
    pub include_alternate_sources: bool,
    pub default_location: String,
    pub default_threshold: f64,
    pub page_size: usize,
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            country: "India".to_string(),
            live_search_cap: 12,
            include_alternate_sources: true,
            default_location: "India".to_string(),
            default_threshold: DEFAULT_THRESHOLD,
            page_size: 12,
            debounce_ms: 300,
        }
    }
}

impl Config {
    /// Reads `path` if given (it must exist), otherwise the per-user config
    /// file if present, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "jobscout")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse config")
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.auth_token = Some(token.trim().to_string());
        }
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::from_count(self.page_size).unwrap_or_else(|| {
            warn!(page_size = self.page_size, "page_size must be 6, 12 or 24; using 12");
            PageSize::Twelve
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            default_threshold: clamp_threshold(self.default_threshold),
            default_location: self.default_location.clone(),
            page_size: self.page_size(),
            live: LiveSearchDefaults {
                country: self.country.clone(),
                max_results: self.live_search_cap,
                include_alternate_sources: self.include_alternate_sources,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            api_base_url = "https://jobs.internal/api"
            page_size = 24
            default_location = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://jobs.internal/api");
        assert_eq!(config.page_size(), PageSize::TwentyFour);
        assert_eq!(config.country, "India");
        assert_eq!(config.live_search_cap, 12);
        assert_eq!(config.default_location, "");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_toml("page_size = 10\ndefault_threshold = 4.0").unwrap();
        assert_eq!(config.page_size(), PageSize::Twelve);
        let settings = config.session_settings();
        assert_eq!(settings.default_threshold, 1.0);
        assert_eq!(settings.debounce, Duration::from_millis(300));
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(Config::from_toml("page_size = \"many\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "JOBSCOUT_API_URL" => Some("http://10.0.0.5:8000/api".to_string()),
            "JOBSCOUT_TOKEN" => Some(" abc123 \n".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://10.0.0.5:8000/api");
        assert_eq!(config.auth_token.as_deref(), Some("abc123"));

        let mut config = Config::default();
        config.apply_overrides(|_| Some(String::new()));
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert!(config.auth_token.is_none());
    }
}
