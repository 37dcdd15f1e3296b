// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Client configuration stored in `~/.optrack/config.json`.
//!
//! A missing file means defaults. Unknown keys are ignored and missing keys
//! take their default, so older config files keep loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api_url`.
pub const API_URL_ENV: &str = "OPTRACK_API_URL";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

const CONFIG_FILE: &str = "config.json";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_warning_after_secs() -> u64 {
    30 * 60
}

fn default_auto_logout_after_secs() -> u64 {
    5 * 60
}

fn default_poll_interval_secs() -> u64 {
    10
}

/// Inactivity monitor timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Inactivity (strictly greater than) that triggers the warning.
    #[serde(default = "default_warning_after_secs")]
    pub warning_after_secs: u64,
    /// Grace period between the warning and the forced logout.
    #[serde(default = "default_auto_logout_after_secs")]
    pub auto_logout_after_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            warning_after_secs: default_warning_after_secs(),
            auto_logout_after_secs: default_auto_logout_after_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl SessionSettings {
    pub fn warning_after(&self) -> Duration {
        Duration::from_secs(self.warning_after_secs)
    }

    pub fn auto_logout_after(&self) -> Duration {
        Duration::from_secs(self.auto_logout_after_secs)
    }

    /// Never zero: a zero-period interval would panic.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub session: SessionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            session: SessionSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Apply `--api-url`, then `OPTRACK_API_URL`, in that order of precedence.
    pub fn with_overrides(mut self, cli_api_url: Option<&str>) -> Self {
        let env_url = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        if let Some(url) = cli_api_url.map(str::to_string).or(env_url) {
            self.api_url = url;
        }
        self
    }

    /// Base URL of every REST endpoint: `<api_url>/api`.
    pub fn api_base(&self) -> String {
        format!("{}/api", self.api_url.trim_end_matches('/'))
    }
}

/// `~/.optrack`, created when missing.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let dir = home.join(".optrack");
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

pub fn load_config() -> Result<AppConfig> {
    load_from(&config_path()?)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_to(config, &config_path()?)
}

pub fn load_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

pub fn save_to(config: &AppConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("CONFIG_SAVED | path={}", path.display());
    Ok(())
}

/// Validate a user-supplied API URL before storing it.
pub fn normalize_api_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(url).with_context(|| format!("'{}' is not a valid URL", url))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("API URL must start with http:// or https://, got '{}'", url);
    }
    Ok(url.to_string())
}
