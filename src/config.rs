//! Runtime settings and defaults.
//!
//! Values are read from the environment (a `.env` file is loaded by `main`
//! through `dotenv`). Command line flags override what is read here.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// RDFE management endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://management.core.windows.net";
/// Value of the `x-ms-version` header when the caller sets none.
pub const DEFAULT_API_VERSION: &str = "2014-06-01";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_POLL_MAX_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_POLL_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 100;
pub const DEFAULT_PROFILE_FILE: &str = "profile.json";
pub const PROFILE_DIR: &str = ".azure-sm";

/// Effective settings of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub api_version: String,
    pub user_agent: String,
    pub poll_interval: Duration,
    pub poll_max_interval: Duration,
    pub operation_timeout: Duration,
    pub request_timeout: Duration,
    pub profile_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: default_user_agent(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            poll_max_interval: Duration::from_secs(DEFAULT_POLL_MAX_INTERVAL_SECS),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            profile_path: default_profile_path(),
        }
    }
}

impl Settings {
    /// Build settings from `AZURE_SM_*` environment variables.
    pub fn from_env() -> Result<Settings> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(v) = lookup("AZURE_SM_ENDPOINT") {
            settings.endpoint = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("AZURE_SM_API_VERSION") {
            settings.api_version = v;
        }
        if let Some(v) = lookup("AZURE_SM_USER_AGENT") {
            settings.user_agent = v;
        }
        if let Some(v) = lookup("AZURE_SM_POLL_INTERVAL_SECS") {
            settings.poll_interval = parse_secs("AZURE_SM_POLL_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("AZURE_SM_POLL_MAX_INTERVAL_SECS") {
            settings.poll_max_interval = parse_secs("AZURE_SM_POLL_MAX_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("AZURE_SM_TIMEOUT_SECS") {
            settings.operation_timeout = parse_secs("AZURE_SM_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("AZURE_SM_REQUEST_TIMEOUT_SECS") {
            settings.request_timeout = parse_secs("AZURE_SM_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("AZURE_SM_PROFILE") {
            settings.profile_path = PathBuf::from(v);
        }

        if settings.poll_max_interval < settings.poll_interval {
            log::warn!(
                "poll max interval {:?} below interval {:?}, raising it",
                settings.poll_max_interval,
                settings.poll_interval
            );
            settings.poll_max_interval = settings.poll_interval;
        }

        Ok(settings)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| Error::config(format!("{key}='{value}' is not a number of seconds: {e}")))
}

pub fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// `~/.azure-sm/profile.json`, or the working directory when there is no home.
pub fn default_profile_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PROFILE_DIR)
        .join(DEFAULT_PROFILE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(s.api_version, "2014-06-01");
        assert_eq!(s.poll_interval, Duration::from_secs(1));
        assert_eq!(s.poll_max_interval, Duration::from_secs(30));
        assert!(s.user_agent.starts_with("azure-service-management/"));
    }

    #[test]
    fn test_overrides() {
        let s = Settings::from_lookup(lookup(&[
            ("AZURE_SM_ENDPOINT", "https://example.test/"),
            ("AZURE_SM_API_VERSION", "2015-04-01"),
            ("AZURE_SM_TIMEOUT_SECS", "3"),
            ("AZURE_SM_PROFILE", "/tmp/p.json"),
        ]))
        .unwrap();
        assert_eq!(s.endpoint, "https://example.test");
        assert_eq!(s.api_version, "2015-04-01");
        assert_eq!(s.operation_timeout, Duration::from_secs(3));
        assert_eq!(s.profile_path, PathBuf::from("/tmp/p.json"));
    }

    #[test]
    fn test_invalid_number() {
        let err = Settings::from_lookup(lookup(&[("AZURE_SM_POLL_INTERVAL_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_max_interval_raised_to_interval() {
        let s = Settings::from_lookup(lookup(&[
            ("AZURE_SM_POLL_INTERVAL_SECS", "10"),
            ("AZURE_SM_POLL_MAX_INTERVAL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(s.poll_max_interval, Duration::from_secs(10));
    }
}
