//! Server configuration, read once from the environment at startup.

use std::collections::HashSet;
use std::fmt;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use odyssey_core::backend::BackendMode;
use odyssey_core::wire::WireFormat;
use odyssey_gemini::config::GeminiConfig;
use odyssey_generation::application::command_handlers::{GenerationSettings, RetryPolicy};

use crate::error::AppError;

/// Everything the server needs, resolved and validated.
#[derive(Clone)]
pub struct ApiConfig {
    /// Gemini client configuration.
    pub gemini: GeminiConfig,
    /// Accepted API tokens.
    pub api_tokens: HashSet<String>,
    /// Key spellings of adventures returned to clients.
    pub response_format: WireFormat,
    /// Retry policy and adventure limits.
    pub settings: GenerationSettings,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl ApiConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("GEMINI_API_KEY").ok_or_else(|| missing("GEMINI_API_KEY"))?;
        let api_tokens: HashSet<String> = get("ODYSSEY_API_TOKENS")
            .ok_or_else(|| missing("ODYSSEY_API_TOKENS"))?
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
        if api_tokens.is_empty() {
            return Err(AppError::Config(
                "ODYSSEY_API_TOKENS must list at least one token".to_owned(),
            ));
        }

        let mut gemini = GeminiConfig::new(api_key);
        if let Some(model) = get("GEMINI_MODEL") {
            gemini.model = model;
        }
        if let Some(base_url) = get("GEMINI_BASE_URL") {
            base_url
                .trim_end_matches('/')
                .clone_into(&mut gemini.base_url);
        }
        gemini.mode = parse_or(get("GEMINI_MODE"), "GEMINI_MODE", BackendMode::Structured)?;
        gemini.wire_format = parse_or(
            get("GEMINI_WIRE_FORMAT"),
            "GEMINI_WIRE_FORMAT",
            WireFormat::Underscored,
        )?;

        let response_format = parse_or(
            get("ODYSSEY_RESPONSE_FORMAT"),
            "ODYSSEY_RESPONSE_FORMAT",
            WireFormat::Spaced,
        )?;

        let defaults = GenerationSettings::default();
        let max_attempts: u32 = parse_or(
            get("GENERATION_MAX_ATTEMPTS"),
            "GENERATION_MAX_ATTEMPTS",
            defaults.retry.max_attempts,
        )?;
        let timeout_secs: u64 = parse_or(
            get("GENERATION_ATTEMPT_TIMEOUT_SECS"),
            "GENERATION_ATTEMPT_TIMEOUT_SECS",
            defaults.retry.attempt_timeout.as_secs(),
        )?;
        let exposition_max_chars: usize = parse_or(
            get("EXPOSITION_MAX_CHARS"),
            "EXPOSITION_MAX_CHARS",
            defaults.exposition_max_chars,
        )?;
        positive("GENERATION_MAX_ATTEMPTS", u64::from(max_attempts))?;
        positive("GENERATION_ATTEMPT_TIMEOUT_SECS", timeout_secs)?;
        positive("EXPOSITION_MAX_CHARS", exposition_max_chars as u64)?;

        let settings = GenerationSettings {
            retry: RetryPolicy {
                max_attempts,
                attempt_timeout: Duration::from_secs(timeout_secs),
            },
            exposition_max_chars,
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_owned());
        let port = parse_or(get("PORT"), "PORT", 3000_u16)?;

        Ok(Self {
            gemini,
            api_tokens,
            response_format,
            settings,
            host,
            port,
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `HOST` and `PORT` do not form a valid
    /// socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT: {e}")))
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("gemini", &self.gemini)
            .field(
                "api_tokens",
                &format_args!("<{} tokens>", self.api_tokens.len()),
            )
            .field("response_format", &self.response_format)
            .field("settings", &self.settings)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

fn missing(key: &str) -> AppError {
    AppError::Config(format!("{key} environment variable must be set"))
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    value.map_or(Ok(default), |v| {
        v.parse()
            .map_err(|e| AppError::Config(format!("{key} is invalid: {e}")))
    })
}

fn positive(key: &str, value: u64) -> Result<(), AppError> {
    if value == 0 {
        return Err(AppError::Config(format!("{key} must be greater than 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("GEMINI_API_KEY", "AIza-test"),
        ("ODYSSEY_API_TOKENS", "alpha, beta ,,"),
    ];

    #[test]
    fn test_defaults_apply_when_only_required_vars_are_set() {
        // Act
        let config = ApiConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        // Assert
        assert_eq!(config.gemini.api_key, "AIza-test");
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.mode, BackendMode::Structured);
        assert_eq!(config.gemini.wire_format, WireFormat::Underscored);
        assert_eq!(config.response_format, WireFormat::Spaced);
        assert_eq!(config.settings, GenerationSettings::default());
        assert_eq!(config.api_tokens.len(), 2);
        assert!(config.api_tokens.contains("beta"));
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_overrides_are_parsed() {
        // Arrange
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("GEMINI_MODE", "free-text"),
            ("GEMINI_BASE_URL", "http://localhost:9000/"),
            ("ODYSSEY_RESPONSE_FORMAT", "underscored"),
            ("GENERATION_MAX_ATTEMPTS", "5"),
            ("GENERATION_ATTEMPT_TIMEOUT_SECS", "30"),
            ("EXPOSITION_MAX_CHARS", "800"),
            ("PORT", "8080"),
        ]);

        // Act
        let config = ApiConfig::from_lookup(lookup(&pairs)).unwrap();

        // Assert
        assert_eq!(config.gemini.mode, BackendMode::FreeText);
        assert_eq!(config.gemini.base_url, "http://localhost:9000");
        assert_eq!(config.response_format, WireFormat::Underscored);
        assert_eq!(config.settings.retry.max_attempts, 5);
        assert_eq!(
            config.settings.retry.attempt_timeout,
            Duration::from_secs(30)
        );
        assert_eq!(config.settings.exposition_max_chars, 800);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let pairs = [("ODYSSEY_API_TOKENS", "alpha")];

        let err = ApiConfig::from_lookup(lookup(&pairs)).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_token_list_is_config_error() {
        let err = ApiConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "AIza-test"),
            ("ODYSSEY_API_TOKENS", " , "),
        ]))
        .unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_zero_attempts_is_config_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GENERATION_MAX_ATTEMPTS", "0"));

        let err = ApiConfig::from_lookup(lookup(&pairs)).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("GENERATION_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_unknown_mode_is_config_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("GEMINI_MODE", "streaming"));

        let err = ApiConfig::from_lookup(lookup(&pairs)).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("GEMINI_MODE"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = ApiConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        let debug = format!("{config:?}");

        assert!(!debug.contains("AIza-test"));
        assert!(!debug.contains("alpha"));
    }
}
