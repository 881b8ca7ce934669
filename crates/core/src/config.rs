//! Configuration management
//!
//! Credentials and the default bucket come from a TOML file at
//! `~/.local/cfg/cfr2.toml` and from `CFR2_*` environment variables.
//! Environment values always win over file values for the same field.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default configuration file location (tilde-expanded at runtime)
pub const DEFAULT_CONFIG_PATH: &str = "~/.local/cfg/cfr2.toml";

/// Environment variable that replaces the default configuration file path
pub const CONFIG_PATH_ENV: &str = "CFR2_CONFIG_FILE";

pub const ACCOUNT_ID_ENV: &str = "CFR2_ACCOUNT_ID";
pub const ACCESS_KEY_ID_ENV: &str = "CFR2_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "CFR2_SECRET_ACCESS_KEY";
pub const DEFAULT_BUCKET_ENV: &str = "CFR2_DEFAULT_BUCKET";

/// R2 access configuration
///
/// Field names in the file follow the `AccountID` / `AccessKeyID` casing.
/// Unknown keys are ignored and every key is optional until validation.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(rename = "AccountID", default)]
    pub account_id: String,

    #[serde(rename = "AccessKeyID", default)]
    pub access_key_id: String,

    #[serde(rename = "SecretAccessKey", default)]
    pub secret_access_key: String,

    #[serde(rename = "DefaultBucket", default)]
    pub default_bucket: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("default_bucket", &self.default_bucket)
            .finish()
    }
}

impl Config {
    /// Apply environment overrides on top of this configuration
    pub fn merge(mut self, env: &EnvOverrides) -> Self {
        if let Some(v) = &env.account_id {
            self.account_id = v.clone();
        }
        if let Some(v) = &env.access_key_id {
            self.access_key_id = v.clone();
        }
        if let Some(v) = &env.secret_access_key {
            self.secret_access_key = v.clone();
        }
        if let Some(v) = &env.default_bucket {
            self.default_bucket = v.clone();
        }
        self
    }

    /// Check that every required field is present
    ///
    /// `source` is only used to point the user at the file in the message.
    pub fn validate(&self, source: &Path) -> Result<()> {
        let fields = [
            ("AccountID", &self.account_id, ACCOUNT_ID_ENV),
            ("AccessKeyID", &self.access_key_id, ACCESS_KEY_ID_ENV),
            ("SecretAccessKey", &self.secret_access_key, SECRET_ACCESS_KEY_ENV),
            ("DefaultBucket", &self.default_bucket, DEFAULT_BUCKET_ENV),
        ];

        for (name, value, env) in fields {
            if value.is_empty() {
                return Err(Error::Config(format!(
                    "{name} is not set. Please provide it in {} or via {env} environment variable",
                    source.display()
                )));
            }
        }

        Ok(())
    }
}

/// Configuration values taken from the process environment
///
/// Only variables that are set and non-empty produce an override.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub account_id: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub default_bucket: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the current process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            account_id: get(ACCOUNT_ID_ENV),
            access_key_id: get(ACCESS_KEY_ID_ENV),
            secret_access_key: get(SECRET_ACCESS_KEY_ENV),
            default_bucket: get(DEFAULT_BUCKET_ENV),
        }
    }
}

/// Locates and loads the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for the default path, honoring `CFR2_CONFIG_FILE`
    pub fn new() -> Self {
        let raw = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self {
            config_path: expand_tilde(&raw),
        }
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk and the process environment
    pub fn load(&self) -> Result<Config> {
        self.load_with(&EnvOverrides::from_env())
    }

    /// Load configuration from disk, apply `env`, then validate
    ///
    /// A missing file is treated as an empty configuration.
    pub fn load_with(&self, env: &EnvOverrides) -> Result<Config> {
        let config = self.read_file()?.merge(env);
        config.validate(&self.config_path)?;
        tracing::debug!(path = %self.config_path.display(), "configuration loaded");
        Ok(config)
    }

    fn read_file(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.config_path.display(), "no configuration file");
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(Error::io(
                    format!("failed to read config file {}", self.config_path.display()),
                    e,
                ));
            }
        };

        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "failed to parse config file {}: {e}",
                self.config_path.display()
            ))
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand a leading `~` to the user's home directory
///
/// Falls back to the path unchanged when the home directory is unknown.
pub fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}
