//! Completion provider implementations.
//!
//! Contains the Gemini implementation of the [`CompletionProvider`] trait
//! defined in `chatly-core`, a factory ([`create_provider`]) that builds the
//! configured provider, and a connectivity probe ([`test_provider_connection`]).
//!
//! [`CompletionProvider`]: chatly_core::llm::provider::CompletionProvider

pub mod gemini;

use std::time::Duration;

use secrecy::SecretString;

use chatly_core::chat::codec::TurnCodec;
use chatly_core::llm::box_provider::BoxCompletionProvider;
use chatly_types::config::ProviderSettings;
use chatly_types::llm::{CompletionResponse, LlmError, ProviderType};

use self::gemini::GeminiProvider;

/// Create a [`BoxCompletionProvider`] from the provider settings.
///
/// `api_key` is the resolved secret (read from the environment variable named
/// by `settings.api_key_env`).
///
/// # Errors
///
/// `AuthenticationFailed` when no key is available.
pub fn create_provider(
    settings: &ProviderSettings,
    api_key: Option<&str>,
) -> Result<BoxCompletionProvider, LlmError> {
    match settings.provider_type {
        ProviderType::Gemini => {
            let key = api_key
                .filter(|k| !k.is_empty())
                .ok_or(LlmError::AuthenticationFailed)?;
            let mut provider = GeminiProvider::new(
                SecretString::from(key.to_string()),
                settings.model.clone(),
                Duration::from_secs(settings.request_timeout_secs),
            )?
            .with_system_instruction(settings.system_instruction.clone())
            .with_generation_config(settings.temperature, settings.max_output_tokens);
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(BoxCompletionProvider::new(provider))
        }
    }
}

/// Send a one-turn "Hello" history to verify the key and endpoint.
pub async fn test_provider_connection(
    provider: &BoxCompletionProvider,
) -> Result<CompletionResponse, LlmError> {
    provider.generate(&[TurnCodec::to_user_turn("Hello")]).await
}
