//! Application state wiring all services together.
//!
//! `AuthService` is generic over its ports; AppState pins it to the concrete
//! infra implementations. The connection registry is shared by every
//! WebSocket handler.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};

use chatly_core::auth::service::AuthService;
use chatly_core::chat::invoker::CompletionInvoker;
use chatly_core::chat::registry::ConnectionRegistry;
use chatly_core::llm::box_provider::BoxCompletionProvider;
use chatly_infra::config::{
    apply_env_overrides, env_lookup, load_secrets, load_server_config, resolve_data_dir,
};
use chatly_infra::crypto::password::Argon2PasswordHasher;
use chatly_infra::crypto::token::HmacTokenIssuer;
use chatly_infra::llm::create_provider;
use chatly_infra::blacklist::ConfiguredBlacklist;
use chatly_infra::sqlite::pool::{DatabasePool, database_url};
use chatly_infra::sqlite::user::SqliteUserRepository;
use chatly_types::config::ServerConfig;

use crate::http::cookie::CookieSettings;

/// Concrete type alias for the auth service pinned to infra implementations.
pub type ConcreteAuthService = AuthService<
    SqliteUserRepository,
    Argon2PasswordHasher,
    HmacTokenIssuer,
    ConfiguredBlacklist,
>;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<ConcreteAuthService>,
    pub registry: Arc<ConnectionRegistry>,
    pub cookie: CookieSettings,
    pub config: Arc<ServerConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

/// Configuration resolved from disk and environment, before any I/O-heavy setup.
pub struct LoadedConfig {
    pub data_dir: PathBuf,
    pub config: ServerConfig,
}

/// Resolve the data directory, read `config.toml` and apply env overrides.
pub async fn load_config() -> anyhow::Result<LoadedConfig> {
    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let mut config = load_server_config(&data_dir).await;
    apply_env_overrides(&mut config, env_lookup);
    Ok(LoadedConfig { data_dir, config })
}

impl AppState {
    /// Initialize from the environment: config, secrets, database, provider.
    pub async fn init(loaded: LoadedConfig) -> anyhow::Result<Self> {
        let secrets = load_secrets(&loaded.config, env_lookup)?;

        let api_key = secrets.provider_api_key.as_ref().map(|k| k.expose_secret());
        let provider = create_provider(&loaded.config.provider, api_key).with_context(|| {
            format!(
                "failed to create {} provider (is {} set?)",
                loaded.config.provider.provider_type, loaded.config.provider.api_key_env
            )
        })?;

        Self::build(loaded, secrets.token_secret, provider).await
    }

    /// Wire services around an already constructed provider.
    pub async fn build(
        loaded: LoadedConfig,
        token_secret: SecretString,
        provider: BoxCompletionProvider,
    ) -> anyhow::Result<Self> {
        let LoadedConfig { data_dir, config } = loaded;

        let token_issuer = HmacTokenIssuer::new(token_secret, config.token_ttl_secs)
            .context("invalid token configuration")?;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open database")?;

        let auth_service = AuthService::new(
            SqliteUserRepository::new(db_pool.clone()),
            Argon2PasswordHasher::new(),
            token_issuer,
            ConfiguredBlacklist::new(config.blacklist, &db_pool),
        );

        tracing::info!(
            provider = provider.name(),
            model = provider.model(),
            history_limit = config.history_limit,
            "completion provider ready"
        );
        let invoker = Arc::new(CompletionInvoker::new(
            provider,
            config.fallback_message.clone(),
        ));
        let registry = ConnectionRegistry::new(invoker, config.history_limit);

        let cookie = CookieSettings {
            secure: config.cookie_secure,
            max_age_secs: auth_service.token_validity().num_seconds(),
        };

        Ok(Self {
            auth_service: Arc::new(auth_service),
            registry: Arc::new(registry),
            cookie,
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chatly_core::llm::provider::CompletionProvider;
    use chatly_types::llm::{CompletionResponse, LlmError};
    use chatly_types::turn::Turn;
    use tempfile::TempDir;

    struct UnusedProvider;

    impl CompletionProvider for UnusedProvider {
        fn name(&self) -> &str {
            "unused"
        }

        fn model(&self) -> &str {
            "unused"
        }

        async fn generate(&self, _history: &[Turn]) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::Timeout)
        }
    }

    fn loaded(tmp: &TempDir, token_ttl_secs: u64) -> LoadedConfig {
        LoadedConfig {
            data_dir: tmp.path().to_path_buf(),
            config: ServerConfig {
                token_ttl_secs,
                ..ServerConfig::default()
            },
        }
    }

    #[tokio::test]
    async fn test_build_rejects_out_of_range_token_ttl() {
        let tmp = TempDir::new().unwrap();
        let result = AppState::build(
            loaded(&tmp, u64::MAX),
            SecretString::from("s".to_string()),
            BoxCompletionProvider::new(UnusedProvider),
        )
        .await;

        let err = result.err().expect("huge ttl must fail");
        assert!(format!("{err:#}").contains("token_ttl_secs"), "{err:#}");
    }

    #[tokio::test]
    async fn test_build_sets_cookie_max_age_from_ttl() {
        let tmp = TempDir::new().unwrap();
        let state = AppState::build(
            loaded(&tmp, 3600),
            SecretString::from("s".to_string()),
            BoxCompletionProvider::new(UnusedProvider),
        )
        .await
        .unwrap();

        assert_eq!(state.cookie.max_age_secs, 3600);
    }
}
