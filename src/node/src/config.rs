//! Portal configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use carelink_authz::EngineConfig;
use carelink_store::{Preferences, StoreConfig};
use carelink_sync::CacheConfig;

/// Complete portal configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
    pub api: ApiSection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub refresh: RefreshSection,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub audit: AuditSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiSection {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSection {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshSection {
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSection {
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sensitive_resource_types")]
    pub sensitive_resource_types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_true() -> bool { true }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_ttl_secs() -> u64 { 300 }
fn default_interval_ms() -> u64 { 30_000 }
fn default_session_path() -> PathBuf { PathBuf::from("carelink-session.json") }
fn default_log_level() -> String { "info".to_string() }
fn default_sensitive_resource_types() -> Vec<String> {
    EngineConfig::default().sensitive_resource_types
}

impl Default for CacheSection {
    fn default() -> Self {
        Self { ttl_secs: default_ttl_secs() }
    }
}

impl Default for RefreshSection {
    fn default() -> Self {
        Self {
            auto_refresh: default_true(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self { path: default_session_path() }
    }
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sensitive_resource_types: default_sensitive_resource_types(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

impl PortalConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read configuration file {:?}", path.as_ref()))?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse configuration file")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }

        if self.api.timeout_ms == 0 {
            anyhow::bail!("api.timeout_ms must be greater than zero");
        }

        if self.cache.ttl_secs == 0 {
            anyhow::bail!("cache.ttl_secs must be greater than zero");
        }

        if self.refresh.interval_ms < 1_000 {
            anyhow::bail!("refresh.interval_ms must be at least 1000");
        }

        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api.timeout_ms)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            enable_audit: self.audit.enabled,
            sensitive_resource_types: self.audit.sensitive_resource_types.clone(),
            ..Default::default()
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            cache: CacheConfig {
                ttl: Duration::from_secs(self.cache.ttl_secs),
            },
            default_preferences: Preferences {
                auto_refresh: self.refresh.auto_refresh,
                refresh_interval_ms: self.refresh.interval_ms,
            },
        }
    }
}
