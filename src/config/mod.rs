mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./yuzu.toml",
        "~/.config/yuzu/config.toml",
        "/etc/yuzu/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!(path = %path.display(), "using config file");
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Whether the process runs in development mode (`APP_ENV` unset or
/// `development`).
pub fn is_development() -> bool {
    match std::env::var("APP_ENV") {
        Ok(env) => env.is_empty() || env == "development",
        Err(_) => true,
    }
}

/// Provider directories searched when none are configured.
///
/// Development adds the repository-local `config/providers` first; then the
/// user config dir (`$XDG_CONFIG_HOME/yuzu` or `~/.config/yuzu`) and the
/// system dirs, each with a `providers` subdirectory.
pub fn default_provider_dirs() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if is_development() {
        roots.push(PathBuf::from("config"));
    }

    match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => roots.push(PathBuf::from(xdg).join("yuzu")),
        _ => roots.push(PathBuf::from(shellexpand::tilde("~/.config/yuzu").as_ref())),
    }

    roots.push(PathBuf::from("/etc/xdg/yuzu"));
    roots.push(PathBuf::from("/etc/yuzu"));

    roots.into_iter().map(|root| root.join("providers")).collect()
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.providers.request_timeout_secs == 0 {
        anyhow::bail!("Provider request timeout cannot be 0");
    }

    if config.providers.extensions.is_empty() {
        anyhow::bail!("At least one provider file extension is required");
    }

    for dir in &config.providers.dirs {
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "provider directory does not exist");
        }
    }

    Ok(())
}
