//! Scripted completion provider shared by the chat tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatly_types::llm::{CompletionResponse, LlmError, Usage};
use chatly_types::turn::Turn;

use crate::llm::box_provider::BoxCompletionProvider;
use crate::llm::provider::CompletionProvider;

use super::invoker::CompletionInvoker;

pub(crate) const FALLBACK: &str = "⚠️ Sorry, something went wrong.";

pub(crate) enum Step {
    Reply(&'static str),
    DelayedReply(Duration, &'static str),
    Fail(LlmError),
    Panic,
}

/// Replays a script of steps; once the script runs out it echoes the last turn.
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Step>>,
    calls: Arc<Mutex<Vec<Vec<Turn>>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(steps: Vec<Step>) -> (Self, Arc<Mutex<Vec<Vec<Turn>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = Self {
            script: Mutex::new(steps.into()),
            calls: calls.clone(),
        };
        (provider, calls)
    }
}

fn response(content: &str) -> CompletionResponse {
    CompletionResponse {
        content: content.to_string(),
        model: "scripted".to_string(),
        finish_reason: Some("STOP".to_string()),
        usage: Usage::default(),
    }
}

impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, history: &[Turn]) -> Result<CompletionResponse, LlmError> {
        self.calls.lock().unwrap().push(history.to_vec());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(response(text)),
            Some(Step::DelayedReply(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(response(text))
            }
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Panic) => panic!("scripted provider panic"),
            None => {
                let last = history.last().map(|t| t.content()).unwrap_or_default();
                Ok(response(&format!("echo: {last}")))
            }
        }
    }
}

pub(crate) fn scripted_invoker(
    steps: Vec<Step>,
) -> (Arc<CompletionInvoker>, Arc<Mutex<Vec<Vec<Turn>>>>) {
    let (provider, calls) = ScriptedProvider::new(steps);
    let invoker = CompletionInvoker::new(BoxCompletionProvider::new(provider), FALLBACK);
    (Arc::new(invoker), calls)
}
