use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::auth::oauth;
use crate::config::Config;

/// Tokens expiring within this many seconds are treated as expired
pub const EXPIRY_MARGIN_SECS: i64 = 60;
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Token cache entry (`token.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds
    pub expires_at: i64,
}

impl StoredToken {
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.expires_at > now + EXPIRY_MARGIN_SECS
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    DEFAULT_EXPIRES_IN
}

impl TokenResponse {
    /// Cache entry for this response; keeps the old refresh token if none was issued
    pub fn into_stored(self, previous_refresh: Option<&str>, now: i64) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_at: now + self.expires_in,
        }
    }
}

/// Read the cache; a missing or unreadable cache means "no token"
pub fn load(path: &Path) -> Result<Option<StoredToken>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str::<StoredToken>(&contents) {
        Ok(token) => Ok(Some(token)),
        Err(e) => {
            warn!("Ignoring malformed token cache {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Write the cache, readable by the owner only
pub fn save(path: &Path, token: &StoredToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let contents = serde_json::to_string_pretty(token)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!("Saved token to {}", path.display());
    Ok(())
}

/// Bearer token for the task service, signing in if needed
pub fn access_token(config: &Config) -> Result<String> {
    let path = config.token_path();
    let now = Utc::now().timestamp();

    if let Some(cached) = load(&path)? {
        if cached.is_valid_at(now) {
            debug!("Using cached token from {}", path.display());
            return Ok(cached.access_token);
        }

        if let Some(refresh) = cached.refresh_token.as_deref() {
            match refresh_token(config, refresh) {
                Ok(token) => {
                    save(&path, &token)?;
                    return Ok(token.access_token);
                }
                Err(e) => warn!("Token refresh failed, signing in again: {:#}", e),
            }
        }
    }

    let token = oauth::authorize(config)?;
    save(&path, &token)?;
    Ok(token.access_token)
}

pub fn token_endpoint(config: &Config) -> String {
    format!("{}/token", config.authority_url.trim_end_matches('/'))
}

/// Trade a refresh token for a fresh access token
pub fn refresh_token(config: &Config, refresh: &str) -> Result<StoredToken> {
    debug!("Refreshing access token");
    request_token(
        config,
        &[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("refresh_token", refresh),
            ("grant_type", "refresh_token"),
            ("scope", oauth::SCOPES),
        ],
        Some(refresh),
    )
}

/// Trade an authorization code for tokens
pub fn exchange_code(config: &Config, code: &str, redirect_uri: &str) -> Result<StoredToken> {
    debug!("Exchanging authorization code");
    request_token(
        config,
        &[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("scope", oauth::SCOPES),
        ],
        None,
    )
}

fn request_token(config: &Config, form: &[(&str, &str)], previous_refresh: Option<&str>) -> Result<StoredToken> {
    let response = Client::new().post(token_endpoint(config)).form(form).send()?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        bail!("token request failed: HTTP {}{}", status, describe_oauth_error(&body));
    }

    let token: TokenResponse = response.json()?;
    Ok(token.into_stored(previous_refresh, Utc::now().timestamp()))
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn describe_oauth_error(body: &str) -> String {
    match serde_json::from_str::<OAuthErrorBody>(body.trim()) {
        Ok(OAuthErrorBody { error, error_description: Some(description) }) => {
            format!(": {} ({})", description.lines().next().unwrap_or_default(), error)
        }
        Ok(OAuthErrorBody { error, error_description: None }) => format!(": {}", error),
        Err(_) => String::new(),
    }
}
