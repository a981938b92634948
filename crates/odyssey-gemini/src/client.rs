//! Gemini `generateContent` client.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use odyssey_core::backend::{BackendMode, BackendOutput, GenerationBackend};
use odyssey_core::error::GenerationError;
use odyssey_core::wire::{self, WireFormat};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{GeminiConfig, SafetySetting, SamplingConfig};
use crate::schema::response_schema;

/// Finish reasons that mean the candidate was withheld or cut by a filter.
const BLOCKING_FINISH_REASONS: &[&str] =
    &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "RECITATION"];

/// Longest slice of an upstream error body carried into an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// Gemini-backed `GenerationBackend`.
///
/// Cheap to clone; the HTTP connection pool and configuration are shared.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    config: Arc<GeminiConfig>,
    schema: Option<Arc<Value>>,
}

impl GeminiBackend {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` if the HTTP client cannot be
    /// built (for example, if no TLS backend is available).
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        let schema = match config.mode {
            BackendMode::Structured => Some(Arc::new(response_schema(config.wire_format))),
            BackendMode::FreeText => None,
        };

        Ok(Self {
            client,
            endpoint,
            config: Arc::new(config),
            schema,
        })
    }

    /// The full `generateContent` URL this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateContentRequest<'a> {
        let structured = self.schema.is_some();
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfigBody {
                sampling: &self.config.sampling,
                response_mime_type: structured.then_some("application/json"),
                response_schema: self.schema.as_deref(),
            },
            safety_settings: &self.config.safety_settings,
        }
    }

    async fn fetch_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| backend_error("request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(GenerationError::Backend(format!(
                "upstream returned {status}: {snippet}"
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| backend_error("unreadable upstream response", e))?;

        extract_text(api_response)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn mode(&self) -> BackendMode {
        self.config.mode
    }

    fn wire_format(&self) -> WireFormat {
        self.config.wire_format
    }

    #[instrument(skip_all, fields(model = %self.config.model, mode = ?self.config.mode))]
    async fn invoke(&self, prompt: &str) -> Result<BackendOutput, GenerationError> {
        debug!(
            prompt_chars = prompt.chars().count(),
            "calling generateContent"
        );
        let text = self.fetch_text(prompt).await?;
        debug!(
            response_chars = text.chars().count(),
            "received generateContent response"
        );

        match self.config.mode {
            BackendMode::FreeText => Ok(BackendOutput::Text(text)),
            BackendMode::Structured => {
                let value: Value = serde_json::from_str(&text)
                    .map_err(|e| malformed_error("structured output is not JSON", e))?;
                wire::decode(value).map(BackendOutput::Structured)
            }
        }
    }
}

/// Pulls the first candidate's text out of a response, turning filter
/// verdicts into backend errors.
fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        warn!(block_reason = %reason, "prompt blocked by upstream safety filter");
        return Err(GenerationError::Backend(format!(
            "prompt blocked: {reason}"
        )));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::Backend(
            "response contained no candidates".to_owned(),
        ));
    };

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|r| BLOCKING_FINISH_REASONS.contains(r))
    {
        warn!(finish_reason = %reason, "candidate withheld by upstream filter");
        return Err(GenerationError::Backend(format!(
            "candidate blocked: {reason}"
        )));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::Backend(
            "candidate contained no text".to_owned(),
        ));
    }
    Ok(text)
}

fn backend_error(context: &str, err: impl Display) -> GenerationError {
    GenerationError::Backend(format!("{context}: {err}"))
}

fn malformed_error(context: &str, err: impl Display) -> GenerationError {
    GenerationError::MalformedResponse(format!("{context}: {err}"))
}

// =============================================================================
// Gemini API types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfigBody<'a>,
    safety_settings: &'a [SafetySetting],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigBody<'a> {
    #[serde(flatten)]
    sampling: &'a SamplingConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}
