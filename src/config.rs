//! Configuration
//!
//! `config.toml` lives in the config directory (`~/.mstodo` unless
//! `--config-dir`/`MSTODO_CONFIG_DIR` says otherwise):
//!
//! ```toml
//! client-id = "00000000-0000-0000-0000-000000000000"
//! client-secret = "..."
//! port = 8080
//! auth-timeout = 60
//! table-style = "Rounded"
//! ```
//!
//! `--port` and `--auth-timeout` override the file before validation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::cli::output::TableStyle;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const TOKEN_FILE_NAME: &str = "token.json";
pub const DEFAULT_DIR_NAME: &str = ".mstodo";

pub const DEFAULT_API_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// OAuth redirect listener port
    #[serde(default)]
    pub port: i64,
    /// Seconds to wait for the browser sign-in
    #[serde(default)]
    pub auth_timeout: i64,
    #[serde(default = "default_table_style")]
    pub table_style: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_authority_url")]
    pub authority_url: String,
    #[serde(skip)]
    pub config_dir: PathBuf,
}

fn default_table_style() -> String {
    TableStyle::Default.as_str().to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_authority_url() -> String {
    DEFAULT_AUTHORITY_URL.to_string()
}

/// Values given on the command line that win over the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub port: Option<i64>,
    pub auth_timeout: Option<i64>,
}

impl Config {
    /// Load, override and validate `<dir>/config.toml`
    pub fn load(dir: &Path, overrides: ConfigOverrides) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            bail!("could not read config: {} does not exist", path.display());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("could not read config {}", path.display()))?;

        config.config_dir = dir.to_path_buf();
        config.apply(overrides);
        config
            .validate()
            .with_context(|| format!("could not read config {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str::<Config>(contents)?)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(timeout) = overrides.auth_timeout {
            self.auth_timeout = timeout;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            bail!("client-id must not be empty");
        }
        if self.client_secret.trim().is_empty() {
            bail!("client-secret must not be empty");
        }
        if self.port <= 1023 {
            bail!("port must be greater than 1023");
        }
        if self.port > i64::from(u16::MAX) {
            bail!("port must be at most {}", u16::MAX);
        }
        if self.auth_timeout <= 0 {
            bail!("auth-timeout must be greater than 0");
        }
        if TableStyle::from_str(&self.table_style).is_none() {
            bail!(
                "'{}' is not a valid table-style - valid options: {}",
                self.table_style,
                TableStyle::options()
            );
        }
        Ok(())
    }

    /// Validated port as a socket port
    pub fn listen_port(&self) -> u16 {
        u16::try_from(self.port).unwrap_or(u16::MAX)
    }

    pub fn table_style(&self) -> TableStyle {
        TableStyle::from_str(&self.table_style).unwrap_or_default()
    }

    pub fn token_path(&self) -> PathBuf {
        self.config_dir.join(TOKEN_FILE_NAME)
    }
}

/// `~/.mstodo`
pub fn default_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine the home directory")?;
    Ok(home.join(DEFAULT_DIR_NAME))
}
