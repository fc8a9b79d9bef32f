//! BoxCompletionProvider -- object-safe dynamic dispatch wrapper for CompletionProvider.
//!
//! 1. Define an object-safe `CompletionProviderDyn` trait with boxed futures
//! 2. Blanket-impl `CompletionProviderDyn` for all `T: CompletionProvider`
//! 3. `BoxCompletionProvider` wraps `Box<dyn CompletionProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use chatly_types::llm::{CompletionResponse, LlmError};
use chatly_types::turn::Turn;

use super::provider::CompletionProvider;

/// Object-safe version of [`CompletionProvider`] with boxed futures.
pub trait CompletionProviderDyn: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn generate_boxed<'a>(
        &'a self,
        history: &'a [Turn],
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;
}

impl<T: CompletionProvider> CompletionProviderDyn for T {
    fn name(&self) -> &str {
        CompletionProvider::name(self)
    }

    fn model(&self) -> &str {
        CompletionProvider::model(self)
    }

    fn generate_boxed<'a>(
        &'a self,
        history: &'a [Turn],
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.generate(history))
    }
}

/// Type-erased completion provider for runtime provider selection.
///
/// Since `CompletionProvider` uses RPITIT, it cannot be used as a trait
/// object directly. `BoxCompletionProvider` provides equivalent methods that
/// delegate to the inner `CompletionProviderDyn` trait object.
pub struct BoxCompletionProvider {
    inner: Box<dyn CompletionProviderDyn + Send + Sync>,
}

impl BoxCompletionProvider {
    /// Wrap a concrete `CompletionProvider` in a type-erased box.
    pub fn new<T: CompletionProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn model(&self) -> &str {
        self.inner.model()
    }

    /// Produce the next model turn for the given ordered history.
    pub async fn generate(&self, history: &[Turn]) -> Result<CompletionResponse, LlmError> {
        self.inner.generate_boxed(history).await
    }
}
