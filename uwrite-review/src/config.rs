//! Configuration for uwrite-review
//!
//! Resolution: TOML file (`[uwrite]` section) → environment overrides for
//! credentials (`UWRITE_KEY`, `UWRITE_SECRET`). Every option has a compiled
//! default, so a missing TOML file still yields a usable configuration once
//! credentials are provided.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uwrite_common::config::LoggingConfig;
use uwrite_common::{Error, Result};

use crate::models::DEFAULT_MAX_FILE_SIZE;
use crate::services::uwrite_client::CheckType;

pub const KEY_ENV: &str = "UWRITE_KEY";
pub const SECRET_ENV: &str = "UWRITE_SECRET";

pub const DEFAULT_BASE_URL: &str = "https://api.uwrite.com/v2";
pub const DEFAULT_POOL_SIZE: usize = 4;
pub const DEFAULT_LOCALE: &str = "en_US";
pub const DEFAULT_ICON_BASE_PATH: &str = "/sakai-contentreview-tool-uwrite/images";
pub const DEFAULT_BIND: &str = "127.0.0.1:5780";

/// Uwrite integration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UwriteConfig {
    /// API key (static credential)
    pub key: Option<String>,
    /// API secret (static credential)
    pub secret: Option<String>,
    pub base_url: String,
    /// Fixed worker pool size
    pub pool_size: usize,
    pub check_type: CheckType,
    /// Maximum accepted file size in bytes
    pub max_file_size: u64,
    /// Skip the extension/MIME/size eligibility check
    pub allow_any_file_type: bool,
    pub exclude_citations: bool,
    pub exclude_references: bool,
    /// Delay between check status polls
    pub poll_interval_ms: u64,
    /// Give up waiting for a check after this long
    pub check_timeout_secs: u64,
    /// Upper bound on status requests per second, per client
    pub status_requests_per_second: u32,
    /// Locale used when the requesting user has no preference
    pub default_locale: String,
    pub icon_base_path: String,
}

impl Default for UwriteConfig {
    fn default() -> Self {
        Self {
            key: None,
            secret: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            check_type: CheckType::Web,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allow_any_file_type: false,
            exclude_citations: true,
            exclude_references: true,
            poll_interval_ms: 3000,
            check_timeout_secs: 600,
            status_requests_per_second: 5,
            default_locale: DEFAULT_LOCALE.to_string(),
            icon_base_path: DEFAULT_ICON_BASE_PATH.to_string(),
        }
    }
}

/// Validate credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

impl UwriteConfig {
    /// Environment credentials replace TOML ones
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(KEY_ENV) {
            if is_valid_key(&key) {
                if self.key.is_some() {
                    warn!("Uwrite key found in TOML and {}; using environment", KEY_ENV);
                }
                info!("Uwrite key loaded from environment variable");
                self.key = Some(key);
            }
        }

        if let Ok(secret) = std::env::var(SECRET_ENV) {
            if is_valid_key(&secret) {
                self.secret = Some(secret);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let has_key = self.key.as_deref().is_some_and(is_valid_key);
        let has_secret = self.secret.as_deref().is_some_and(is_valid_key);
        if !has_key || !has_secret {
            return Err(Error::Config(format!(
                "Uwrite credentials not configured. Please configure using one of:\n\
                 1. Environment: {}=... and {}=...\n\
                 2. TOML config: [uwrite] key = \"...\" / secret = \"...\"",
                KEY_ENV, SECRET_ENV
            )));
        }

        if self.pool_size == 0 {
            return Err(Error::Config("uwrite.pool_size must be at least 1".to_string()));
        }

        if self.base_url.trim().is_empty() {
            return Err(Error::Config("uwrite.base_url must not be empty".to_string()));
        }

        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "uwrite.poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Full service TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub root_folder: Option<PathBuf>,
    /// Listen address for the HTTP surface
    pub bind: Option<String>,
    pub logging: LoggingConfig,
    pub uwrite: UwriteConfig,
}

impl ServiceConfig {
    /// Load from `path` (defaults if missing), apply env overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: ServiceConfig = match path {
            Some(path) => uwrite_common::config::load_toml_or_default(path)?,
            None => {
                warn!("No config file location available, using defaults");
                ServiceConfig::default()
            }
        };

        config.uwrite.apply_env_overrides();
        config.uwrite.validate()?;

        Ok(config)
    }

    pub fn bind_address(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }
}
