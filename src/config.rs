//! User configuration
//!
//! Read from `~/.ridecompare/config.json`, then overridden by `RIDECOMPARE_*`
//! environment variables and finally by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::types::{RideCompareError, Result};

pub const DEFAULT_ENDPOINT: &str =
    "https://nodejs-serverless-function-express-seven-jet.vercel.app/api/hello";
pub const DEFAULT_CUSTOMER_ID: &str = "67bda9ddfb42731aac8e99ca";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_ENDPOINT: &str = "RIDECOMPARE_ENDPOINT";
pub const ENV_CUSTOMER_ID: &str = "RIDECOMPARE_CUSTOMER_ID";
pub const ENV_TIMEOUT_SECS: &str = "RIDECOMPARE_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Price aggregation endpoint
    pub endpoint: String,
    /// Customer id sent in the Rapido request data
    pub customer_id: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            customer_id: DEFAULT_CUSTOMER_ID.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// `~/.ridecompare/config.json`
    pub fn default_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| RideCompareError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs
            .home_dir()
            .join(".ridecompare")
            .join("config.json"))
    }

    /// Load the default config file and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path()?)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            RideCompareError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(customer_id) = lookup(ENV_CUSTOMER_ID).filter(|v| !v.trim().is_empty()) {
            self.customer_id = customer_id.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                RideCompareError::Config(format!(
                    "{} must be a whole number: {:?}",
                    ENV_TIMEOUT_SECS, raw
                ))
            })?;
        }
        self.validate()
    }

    /// Apply the `--endpoint` override
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Result<Self> {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint.trim().to_string();
            self.validate()?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(RideCompareError::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        url::Url::parse(&self.endpoint).map_err(|e| {
            RideCompareError::Config(format!("invalid endpoint {:?}: {}", self.endpoint, e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.customer_id, DEFAULT_CUSTOMER_ID);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"customer_id": "abc123"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.customer_id, "abc123");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_corrupt_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, RideCompareError::Config(_)));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"endpoint": "not a url"}"#).unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(RideCompareError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                (ENV_ENDPOINT, "http://localhost:3000/api/hello"),
                (ENV_CUSTOMER_ID, "cust-9"),
                (ENV_TIMEOUT_SECS, " 3 "),
            ]))
            .unwrap();

        assert_eq!(config.endpoint, "http://localhost:3000/api/hello");
        assert_eq!(config.customer_id, "cust-9");
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let mut config = Config::default();
        config
            .apply_env(env(&[(ENV_ENDPOINT, "  "), (ENV_CUSTOMER_ID, "")]))
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_bad_timeout_env_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env(env(&[(ENV_TIMEOUT_SECS, "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));

        let mut config = Config::default();
        assert!(config.apply_env(env(&[(ENV_TIMEOUT_SECS, "0")])).is_err());
    }

    #[test]
    fn test_cli_endpoint_wins() {
        let mut config = Config::default();
        config
            .apply_env(env(&[(ENV_ENDPOINT, "http://env.example/api")]))
            .unwrap();

        let config = config
            .with_endpoint(Some("http://flag.example/api".to_string()))
            .unwrap();
        assert_eq!(config.endpoint, "http://flag.example/api");

        let config = config.with_endpoint(None).unwrap();
        assert_eq!(config.endpoint, "http://flag.example/api");
    }

    #[test]
    fn test_invalid_cli_endpoint_is_config_error() {
        let err = Config::default()
            .with_endpoint(Some("not a url".to_string()))
            .unwrap_err();
        assert!(matches!(err, RideCompareError::Config(_)));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_default_path_under_home() {
        if let Ok(path) = Config::default_path() {
            assert!(path.ends_with(".ridecompare/config.json"));
        }
    }
}
