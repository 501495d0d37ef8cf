//! # Configuration
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. `okr.toml` (or the file given with `--config`)
//! 2. Environment: `OKR_API_KEY`, `OKR_RATE_LIMIT`, `OKR_CORS_ORIGINS`
//! 3. CLI flags
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [storage]
//! database = "okr.db"
//! backend = "redb"
//!
//! [security]
//! api_key = "change-me"
//! rate_limit = 100
//! cors_origins = "http://localhost:3000"
//! ```

use okr_core::OkrError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "okr.toml";

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Where records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// ACID redb database
    #[default]
    Redb,
    /// Snapshot file, loaded into memory and written back after changes
    File,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Redb => f.write_str("redb"),
            Backend::File => f.write_str("file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub backend: Backend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("okr.db"),
            backend: Backend::default(),
        }
    }
}

/// HTTP hardening settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bearer key required on every endpoint but `/health`. Empty disables auth.
    pub api_key: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Comma-separated allowed origins, or `*`. Unset means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }
}

impl SecurityConfig {
    /// The API key, if authentication is enabled.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, OkrError> {
        toml::from_str(text).map_err(|e| OkrError::validation(format!("Invalid config: {}", e)))
    }

    /// Load the config file.
    ///
    /// An explicit `path` must exist. Without one, `okr.toml` in the working
    /// directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, OkrError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if required {
                return Err(OkrError::IoError(format!(
                    "Config file '{}' not found",
                    path.display()
                )));
            }
            tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }

        let metadata = std::fs::metadata(&path)
            .map_err(|e| OkrError::IoError(format!("Cannot read config metadata: {}", e)))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(OkrError::validation(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(&path)
            .map_err(|e| OkrError::IoError(format!("Read config: {}", e)))?;
        let config = Self::from_toml(&text)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OKR_API_KEY") {
            self.security.api_key = Some(key);
        }
        if let Some(raw) = lookup("OKR_RATE_LIMIT") {
            match raw.trim().parse() {
                Ok(limit) => self.security.rate_limit = limit,
                Err(_) => tracing::warn!("Ignoring invalid OKR_RATE_LIMIT '{}'", raw),
            }
        }
        if let Some(origins) = lookup("OKR_CORS_ORIGINS") {
            self.security.cors_origins = Some(origins);
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }
}

// =============================================================================
// TESTS
// =============================================================================
