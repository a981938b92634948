//! Client configuration: endpoint, sampling, and safety thresholds.

use std::fmt;
use std::time::Duration;

use odyssey_core::backend::BackendMode;
use odyssey_core::wire::WireFormat;
use serde::Serialize;

/// Default Gemini API base URL.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Transport timeout for a single HTTP request. The retry controller applies
/// its own, usually shorter, per-attempt deadline on top of this.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_mins(2);

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of candidates to generate.
    pub candidate_count: u32,
    /// Top-k cutoff.
    pub top_k: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Cap on generated tokens.
    pub max_output_tokens: u32,
    /// Sequences that end generation.
    pub stop_sequences: Vec<String>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.95,
            candidate_count: 1,
            top_k: 10_000,
            top_p: 0.95,
            max_output_tokens: 1024,
            stop_sequences: Vec::new(),
        }
    }
}

/// Content categories the backend filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HarmCategory {
    /// Hate speech.
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    /// Harassment.
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    /// Dangerous content.
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
    /// Sexually explicit content.
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
}

/// Probability at and above which content is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    /// Block low probability and above (strictest).
    BlockLowAndAbove,
    /// Block medium probability and above.
    BlockMediumAndAbove,
    /// Block only high probability (most permissive that still filters).
    BlockOnlyHigh,
    /// Never block.
    BlockNone,
}

/// One category/threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    /// The filtered category.
    pub category: HarmCategory,
    /// Its blocking threshold.
    pub threshold: HarmBlockThreshold,
}

/// The fixed safety thresholds: strictest for hate speech and harassment,
/// most permissive for explicit content.
#[must_use]
pub fn default_safety_settings() -> Vec<SafetySetting> {
    vec![
        SafetySetting {
            category: HarmCategory::HateSpeech,
            threshold: HarmBlockThreshold::BlockLowAndAbove,
        },
        SafetySetting {
            category: HarmCategory::Harassment,
            threshold: HarmBlockThreshold::BlockLowAndAbove,
        },
        SafetySetting {
            category: HarmCategory::DangerousContent,
            threshold: HarmBlockThreshold::BlockMediumAndAbove,
        },
        SafetySetting {
            category: HarmCategory::SexuallyExplicit,
            threshold: HarmBlockThreshold::BlockOnlyHigh,
        },
    ]
}

/// Everything the Gemini client needs, fixed at construction.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API credential. Never logged.
    pub api_key: String,
    /// Base URL, without trailing slash.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Structured or free-text generation.
    pub mode: BackendMode,
    /// Key spellings used in prompts and the response schema.
    pub wire_format: WireFormat,
    /// Sampling parameters.
    pub sampling: SamplingConfig,
    /// Safety thresholds.
    pub safety_settings: Vec<SafetySetting>,
    /// HTTP transport timeout.
    pub request_timeout: Duration,
}

impl GeminiConfig {
    /// Creates a configuration with the default model, endpoint, sampling,
    /// and safety settings, in structured mode.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
            model: DEFAULT_GEMINI_MODEL.to_owned(),
            mode: BackendMode::Structured,
            wire_format: WireFormat::Underscored,
            sampling: SamplingConfig::default(),
            safety_settings: default_safety_settings(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("mode", &self.mode)
            .field("wire_format", &self.wire_format)
            .field("sampling", &self.sampling)
            .field("safety_settings", &self.safety_settings)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
