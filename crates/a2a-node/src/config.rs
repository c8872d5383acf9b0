//! Node configuration: a nested `NodeConfig` loaded from TOML, with every
//! field defaulted so a partial or absent config file still produces a
//! valid node.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            security: SecurityConfig::default(),
            advanced: AdvancedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_human_name")]
    pub human_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            human_name: default_human_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub registry: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            registry: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Empty means resolve via [`resolve_data_dir`].
    #[serde(default)]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_message_ttl_ms")]
    pub message_ttl_ms: u64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    #[serde(default = "default_rotation_interval_days")]
    pub rotation_interval_days: i64,
    #[serde(default = "default_accepted_versions")]
    pub accepted_versions: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            message_ttl_ms: default_message_ttl_ms(),
            rate_limit_per_minute: default_rate_limit(),
            rotation_interval_days: default_rotation_interval_days(),
            accepted_versions: default_accepted_versions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    #[serde(default = "default_true")]
    pub encryption_enabled: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            encryption_enabled: default_true(),
            log_level: default_log_level(),
        }
    }
}

fn default_name() -> String {
    "ai2ai-node".to_string()
}
fn default_human_name() -> String {
    "Unnamed Operator".to_string()
}
fn default_port() -> u16 {
    18800
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_message_ttl_ms() -> u64 {
    86_400_000
}
fn default_rate_limit() -> u32 {
    20
}
fn default_rotation_interval_days() -> i64 {
    30
}
fn default_accepted_versions() -> Vec<String> {
    vec!["1.0".to_string(), "0.1".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl NodeConfig {
    /// Loads `<data_dir>/config.toml` if present, falling back to defaults.
    /// `explicit_data_dir` takes precedence over everything else per the
    /// data-directory resolution order.
    pub fn load(explicit_data_dir: Option<&str>) -> anyhow::Result<(Self, PathBuf)> {
        let data_dir = resolve_data_dir(explicit_data_dir);
        let config_path = data_dir.join("config.toml");
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        if config.storage.data_dir.is_empty() {
            config.storage.data_dir = data_dir.to_string_lossy().into_owned();
        }
        Ok((config, data_dir))
    }
}

/// Resolves the data directory in precedence order: explicit path,
/// `AI2AI_DATA_DIR` env var, platform default, `/tmp/ai2ai` fallback.
pub fn resolve_data_dir(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var("AI2AI_DATA_DIR") {
        return PathBuf::from(path);
    }
    platform_default_data_dir().unwrap_or_else(|| PathBuf::from("/tmp/ai2ai"))
}

fn platform_default_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support/ai2ai"))
    }
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(|appdata| PathBuf::from(appdata).join("ai2ai"))
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return Some(PathBuf::from(xdg).join("ai2ai"));
        }
        std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/share/ai2ai"))
    }
}
