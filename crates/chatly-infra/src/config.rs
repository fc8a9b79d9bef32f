//! Server configuration loader for Chatly.
//!
//! Reads `config.toml` from the data directory (`~/.chatly/` by default)
//! and deserializes it into [`ServerConfig`]. Falls back to defaults when the
//! file is missing or malformed. A few settings and all secrets come from the
//! environment.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use chatly_types::config::ServerConfig;

/// Name of the environment variable holding the token signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    MissingSecret(String),
}

/// Secrets resolved from the environment. Never written to disk or logs.
pub struct ServerSecrets {
    pub token_secret: SecretString,
    pub provider_api_key: Option<SecretString>,
}

/// `CHATLY_DATA_DIR`, else `~/.chatly`, else `./.chatly`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHATLY_DATA_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".chatly")
}

/// Load server configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ServerConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
pub async fn load_server_config(data_dir: &Path) -> ServerConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServerConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServerConfig::default();
        }
    };

    match toml::from_str::<ServerConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServerConfig::default()
        }
    }
}

/// Apply `PORT`, `CHATLY_HOST` and `CHATLY_CORS_ORIGIN` on top of the file.
///
/// `lookup` is `std::env::var(..).ok()` in production.
pub fn apply_env_overrides(config: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(port) = lookup("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.port = port,
            Err(_) => tracing::warn!("Ignoring invalid PORT value '{port}'"),
        }
    }
    if let Some(host) = lookup("CHATLY_HOST").filter(|h| !h.is_empty()) {
        config.host = host;
    }
    if let Some(origin) = lookup("CHATLY_CORS_ORIGIN").filter(|o| !o.is_empty()) {
        config.cors_origin = origin;
    }
}

/// Resolve the token secret (required) and the provider API key (optional).
pub fn load_secrets(
    config: &ServerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ServerSecrets, ConfigError> {
    let token_secret = lookup(JWT_SECRET_ENV)
        .filter(|s| !s.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingSecret(JWT_SECRET_ENV.to_string()))?;

    let provider_api_key = lookup(&config.provider.api_key_env)
        .filter(|s| !s.is_empty())
        .map(SecretString::from);

    Ok(ServerSecrets {
        token_secret,
        provider_api_key,
    })
}

/// Process environment lookup for [`apply_env_overrides`] and [`load_secrets`].
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
