//! GeminiProvider -- concrete [`CompletionProvider`] for Google Gemini.
//!
//! Sends the whole history to `models/{model}:generateContent` in one
//! non-streaming request. The API key travels in the `x-goog-api-key` header
//! and is wrapped in [`SecretString`] so it never reaches logs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use chatly_core::chat::codec::TurnCodec;
use chatly_core::llm::provider::CompletionProvider;
use chatly_types::llm::{CompletionResponse, LlmError, Usage};
use chatly_types::turn::{Turn, WirePart};

use super::types::{GeminiRequest, GeminiResponse, GenerationConfig, SystemInstruction};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    system_instruction: Option<String>,
    generation: GenerationConfig,
}

impl GeminiProvider {
    /// Create a provider whose HTTP client gives up after `timeout`.
    pub fn new(api_key: SecretString, model: String, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            system_instruction: None,
            generation: GenerationConfig::default(),
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }

    pub fn with_generation_config(
        mut self,
        temperature: Option<f64>,
        max_output_tokens: Option<u32>,
    ) -> Self {
        self.generation = GenerationConfig {
            temperature,
            max_output_tokens,
        };
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request(&self, history: &[Turn]) -> GeminiRequest {
        GeminiRequest {
            contents: TurnCodec::encode_all(history),
            system_instruction: self.system_instruction.as_ref().map(|text| SystemInstruction {
                parts: vec![WirePart { text: text.clone() }],
            }),
            generation_config: (!self.generation.is_empty()).then(|| self.generation.clone()),
        }
    }

    /// Pick the reply out of a successful response.
    fn parse_response(&self, response: GeminiResponse) -> Result<CompletionResponse, LlmError> {
        let model = response.model_version.unwrap_or_else(|| self.model.clone());
        let usage = response
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(LlmError::EmptyResponse(reason));
        };

        let finish_reason = candidate.finish_reason;
        let Some(content) = candidate.content else {
            return Err(LlmError::EmptyResponse(format!(
                "candidate without content (finish reason {})",
                finish_reason.as_deref().unwrap_or("unknown")
            )));
        };

        // Empty text is a valid model turn and is relayed as-is
        let turn = TurnCodec::decode(&content.into_wire_turn())
            .map_err(|e| LlmError::Deserialization(e.to_string()))?;

        Ok(CompletionResponse {
            content: turn.content().to_string(),
            model,
            finish_reason,
            usage,
        })
    }
}

/// Map a non-2xx status to the provider-agnostic error.
fn map_status(status: reqwest::StatusCode, retry_after: Option<u64>, body: String) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after.map(|secs| secs * 1000),
        },
        500 | 503 => LlmError::Overloaded(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

fn map_transport(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        }
    }
}

// GeminiProvider does not derive Debug so the client state is never printed.

impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, history: &[Turn]) -> Result<CompletionResponse, LlmError> {
        if history.is_empty() {
            return Err(LlmError::InvalidRequest(
                "history must contain at least one turn".to_string(),
            ));
        }

        let body = self.build_request(history);
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status, retry_after, error_body));
        }

        let gemini_resp: GeminiResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Deserialization(format!("failed to parse response: {e}"))
            }
        })?;

        self.parse_response(gemini_resp)
    }
}
