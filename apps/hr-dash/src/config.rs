use std::time::Duration;

use platform_api::{ApiResult, ClientConfig, DEFAULT_BASE_URL};
use products_hr::{DEFAULT_REFRESH_INTERVAL, toast};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid HR_API_URL {value:?}: {reason}")]
    InvalidUrl { value: String, reason: String },
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
    pub refresh_interval: Duration,
    pub toast_ttl: Duration,
}

impl AppConfig {
    /// Read settings from the process environment. `.env` is loaded by the
    /// caller before this runs.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("HR_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let api_url = parse_url(&raw_url)?;

        let token = lookup("HR_API_TOKEN").filter(|v| !v.trim().is_empty());
        let timeout = Duration::from_secs(positive(&lookup, "HR_API_TIMEOUT_SECS", 30)?);
        let refresh_interval = Duration::from_secs(positive(
            &lookup,
            "HR_REFRESH_SECS",
            DEFAULT_REFRESH_INTERVAL.as_secs(),
        )?);
        let toast_ttl = Duration::from_millis(positive(
            &lookup,
            "HR_TOAST_TTL_MS",
            toast::DEFAULT_TTL.as_millis() as u64,
        )?);

        Ok(Self {
            api_url,
            token,
            timeout,
            refresh_interval,
            toast_ttl,
        })
    }

    pub fn override_url(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.api_url = parse_url(raw)?;
        Ok(())
    }

    pub fn override_token(&mut self, token: String) {
        if !token.trim().is_empty() {
            self.token = Some(token);
        }
    }

    pub fn client_config(&self) -> ApiResult<ClientConfig> {
        Ok(ClientConfig::new(self.api_url.as_str())?
            .with_token(self.token.clone())
            .with_timeout(self.timeout))
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".into()));
    }
    Ok(url)
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { key, value }),
        },
    }
}
