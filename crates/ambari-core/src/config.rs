//! Provider configuration: explicit values, environment, then config file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

pub const ENV_URL: &str = "AMBARI_URL";
pub const ENV_LOGIN: &str = "AMBARI_LOGIN";
pub const ENV_PASSWORD: &str = "AMBARI_PASSWORD";
pub const ENV_CONFIG: &str = "AMBARI_CONFIG";

/// Values supplied directly by the host. Empty strings count as unset.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub config_file: Option<PathBuf>,
}

/// On-disk fallback configuration with `url`, `login` and `password` keys,
/// in YAML (`.yaml`/`.yml`, the Ambari CLI's `cli.yaml`) or JSON.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let parse_error = |e: &dyn fmt::Display| {
            Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        };

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(&data).map_err(|e| parse_error(&e)),
            _ => serde_json::from_str(&data).map_err(|e| parse_error(&e)),
        }
    }
}

/// Resolved connection settings for the Ambari API.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Base URL including the version prefix, e.g. `http://ambari:8080/api/v1`.
    pub api_url: String,
    pub login: String,
    pub password: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_url", &self.api_url)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve configuration against the process environment.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an injectable environment lookup.
    ///
    /// Each field takes the first non-empty value of: explicit override,
    /// environment variable, config file. Any field still empty is fatal.
    pub fn resolve_with<F>(overrides: ConfigOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |explicit: Option<String>, key: &str| {
            non_empty(explicit).or_else(|| non_empty(env(key)))
        };

        let mut api_url = lookup(overrides.api_url, ENV_URL);
        let mut login = lookup(overrides.login, ENV_LOGIN);
        let mut password = lookup(overrides.password, ENV_PASSWORD);

        let config_file = overrides
            .config_file
            .or_else(|| non_empty(env(ENV_CONFIG)).map(PathBuf::from));

        if let Some(path) = config_file {
            debug!("Loading Ambari config file {}", path.display());
            let file = ConfigFile::load(&path)?;
            api_url = api_url.or_else(|| non_empty(Some(file.url)));
            login = login.or_else(|| non_empty(Some(file.login)));
            password = password.or_else(|| non_empty(Some(file.password)));
        }

        let api_url = api_url.ok_or_else(|| Error::Config("No api_url provided".into()))?;
        let login = login.ok_or_else(|| Error::Config("No login provided".into()))?;
        let password = password.ok_or_else(|| Error::Config("No password provided".into()))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            login,
            password,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
