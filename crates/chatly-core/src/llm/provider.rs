//! CompletionProvider trait definition.
//!
//! This is the core abstraction that all completion backends implement.
//! Providers are stateless per call: every request carries the full history.

use chatly_types::llm::{CompletionResponse, LlmError};
use chatly_types::turn::Turn;

/// Trait for completion provider backends (Gemini, test doubles, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in chatly-infra (e.g., `GeminiProvider`).
pub trait CompletionProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Produce the next model turn for the given ordered history.
    fn generate(
        &self,
        history: &[Turn],
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
