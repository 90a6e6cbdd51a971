use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::metadata::{EngineConfig, PlaceholderPolicy};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Directories searched for provider definitions, in load order.
    #[serde(default = "super::default_provider_dirs")]
    pub dirs: Vec<PathBuf>,

    /// Definition file extensions, without the dot.
    #[serde(default = "yuzu_common::paths::default_provider_extensions")]
    pub extensions: Vec<String>,

    /// Per-call HTTP timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Handling of placeholders still present after substitution.
    #[serde(default)]
    pub unresolved_placeholders: PlaceholderPolicy,
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            dirs: super::default_provider_dirs(),
            extensions: yuzu_common::paths::default_provider_extensions(),
            request_timeout_secs: default_request_timeout(),
            unresolved_placeholders: PlaceholderPolicy::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            unresolved_placeholders: self.unresolved_placeholders,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Reload providers when their files change.
    #[serde(default = "default_watch_enabled")]
    pub enabled: bool,
}

fn default_watch_enabled() -> bool {
    true
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_watch_enabled(),
        }
    }
}
