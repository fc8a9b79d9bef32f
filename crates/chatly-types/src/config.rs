//! Server configuration types for Chatly.
//!
//! `ServerConfig` represents the top-level `config.toml` that controls the
//! listener, the chat session core, session tokens and the completion
//! provider. Secrets never live here; they are read from the environment.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderType;
use crate::turn::MAX_TURNS;

/// Default text sent to a client when a completion fails.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "⚠️ Sorry, something went wrong.";

/// Top-level configuration for the Chatly server.
///
/// Loaded from `~/.chatly/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origin allowed to call the API with credentials.
    pub cors_origin: String,
    /// Maximum turns retained per chat session.
    pub history_limit: usize,
    /// Text emitted in place of a reply when the provider fails.
    pub fallback_message: String,
    /// Validity window of a session token, in seconds.
    pub token_ttl_secs: u64,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// Backing store for revoked tokens.
    pub blacklist: BlacklistBackend,
    pub provider: ProviderSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origin: "http://localhost:5173".to_string(),
            history_limit: MAX_TURNS,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            token_ttl_secs: 24 * 60 * 60,
            cookie_secure: true,
            blacklist: BlacklistBackend::Sqlite,
            provider: ProviderSettings::default(),
        }
    }
}

/// Where revoked tokens are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlacklistBackend {
    Sqlite,
    Memory,
}

/// Completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub provider_type: ProviderType,
    pub model: String,
    /// Override the provider's default base URL.
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub system_instruction: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    /// Transport timeout of the provider HTTP client.
    pub request_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            model: "gemini-2.0-flash".to_string(),
            base_url: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            system_instruction: None,
            temperature: None,
            max_output_tokens: None,
            request_timeout_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default_values() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.history_limit, 30);
        assert_eq!(config.token_ttl_secs, 86_400);
        assert_eq!(config.fallback_message, DEFAULT_FALLBACK_MESSAGE);
        assert_eq!(config.blacklist, BlacklistBackend::Sqlite);
        assert_eq!(config.provider.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_server_config_deserialize_with_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.cookie_secure);
        assert_eq!(config.provider.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_server_config_deserialize_with_values() {
        let toml_str = r#"
port = 8080
history_limit = 10
cookie_secure = false
blacklist = "memory"

[provider]
provider_type = "gemini"
model = "gemini-2.5-flash"
temperature = 0.4
system_instruction = "Answer briefly."
"#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.history_limit, 10);
        assert!(!config.cookie_secure);
        assert_eq!(config.blacklist, BlacklistBackend::Memory);
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.provider.temperature, Some(0.4));
        // Unset nested fields keep their defaults
        assert_eq!(config.provider.request_timeout_secs, 300);
        assert_eq!(config.fallback_message, DEFAULT_FALLBACK_MESSAGE);
    }
}
