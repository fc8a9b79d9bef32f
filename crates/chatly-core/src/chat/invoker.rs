//! Completion invoker with failure containment.
//!
//! The invoker is the only place a provider is called from the chat core.
//! Every provider failure, including a panic inside the provider future,
//! ends here and becomes [`CompletionOutcome::Fallback`]. There is no retry,
//! backoff or circuit breaking.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures_util::FutureExt;
use tracing::Instrument;

use chatly_types::llm::LlmError;
use chatly_types::turn::Turn;

use crate::llm::box_provider::BoxCompletionProvider;

/// Result of one completion attempt, as seen by the session controller.
#[derive(Debug)]
pub enum CompletionOutcome {
    /// The provider produced a reply.
    Reply(String),
    /// The provider failed; `text` is the fixed fallback message.
    Fallback { text: String, reason: LlmError },
}

impl CompletionOutcome {
    /// The text to deliver to the client.
    pub fn text(&self) -> &str {
        match self {
            CompletionOutcome::Reply(text) => text,
            CompletionOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            CompletionOutcome::Reply(text) => text,
            CompletionOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CompletionOutcome::Fallback { .. })
    }
}

/// Calls the completion provider with a full history snapshot.
pub struct CompletionInvoker {
    provider: BoxCompletionProvider,
    fallback_message: String,
}

impl CompletionInvoker {
    pub fn new(provider: BoxCompletionProvider, fallback_message: impl Into<String>) -> Self {
        Self {
            provider,
            fallback_message: fallback_message.into(),
        }
    }

    /// Ask the provider for the next model turn. Never fails.
    pub async fn complete(&self, history: &[Turn]) -> CompletionOutcome {
        let span = tracing::info_span!(
            "chat",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = self.provider.model(),
            chatly.history.turns = history.len(),
        );
        let start = Instant::now();

        let result = AssertUnwindSafe(self.provider.generate(history))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        match result {
            Ok(Ok(response)) => {
                tracing::debug!(
                    parent: &span,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    gen_ai.usage.input_tokens = response.usage.input_tokens,
                    gen_ai.usage.output_tokens = response.usage.output_tokens,
                    "completion succeeded"
                );
                CompletionOutcome::Reply(response.content)
            }
            Ok(Err(err)) => {
                tracing::warn!(
                    parent: &span,
                    error = %err,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "completion failed, sending fallback"
                );
                self.fallback(err)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(parent: &span, panic = %message, "completion provider panicked, sending fallback");
                self.fallback(LlmError::Panicked(message))
            }
        }
    }

    fn fallback(&self, reason: LlmError) -> CompletionOutcome {
        CompletionOutcome::Fallback {
            text: self.fallback_message.clone(),
            reason,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::codec::TurnCodec;
    use crate::chat::testing::{scripted_invoker, Step, FALLBACK};

    #[tokio::test]
    async fn test_reply_passes_through() {
        let (invoker, _) = scripted_invoker(vec![Step::Reply("hello")]);
        let outcome = invoker.complete(&[TurnCodec::to_user_turn("hi")]).await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.text(), "hello");
    }

    #[tokio::test]
    async fn test_full_history_is_sent() {
        let (invoker, calls) = scripted_invoker(vec![Step::Reply("ok")]);
        let history = vec![
            TurnCodec::to_user_turn("one"),
            TurnCodec::to_model_turn("two"),
            TurnCodec::to_user_turn("three"),
        ];
        invoker.complete(&history).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], history);
    }

    #[tokio::test]
    async fn test_provider_error_becomes_fallback() {
        let (invoker, _) = scripted_invoker(vec![Step::Fail(LlmError::Timeout)]);
        let outcome = invoker.complete(&[TurnCodec::to_user_turn("hi")]).await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.text(), FALLBACK);
        match outcome {
            CompletionOutcome::Fallback { reason: LlmError::Timeout, .. } => {}
            other => panic!("expected timeout fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_becomes_fallback() {
        let (invoker, _) = scripted_invoker(vec![Step::Fail(LlmError::RateLimited {
            retry_after_ms: None,
        })]);
        let outcome = invoker.complete(&[]).await;
        assert_eq!(outcome.into_text(), FALLBACK);
    }

    #[tokio::test]
    async fn test_provider_panic_is_contained() {
        let (invoker, _) = scripted_invoker(vec![Step::Panic, Step::Reply("recovered")]);
        let first = invoker.complete(&[TurnCodec::to_user_turn("hi")]).await;
        match &first {
            CompletionOutcome::Fallback { reason: LlmError::Panicked(msg), .. } => {
                assert!(msg.contains("scripted provider panic"));
            }
            other => panic!("expected panic fallback, got {other:?}"),
        }

        // The invoker stays usable after a panic
        let second = invoker.complete(&[TurnCodec::to_user_turn("again")]).await;
        assert_eq!(second.text(), "recovered");
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u8), "unknown panic payload");
    }
}
