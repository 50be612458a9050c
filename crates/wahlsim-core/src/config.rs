//! Process-wide generation settings, built once at startup and injected.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Generation-service credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Fails with [`ConfigError::MissingCredential`] on a missing or blank key.
    pub fn new(key: Option<String>) -> Result<Self, ConfigError> {
        match key {
            Some(k) if !k.trim().is_empty() => Ok(Self(k.trim().to_string())),
            _ => Err(ConfigError::MissingCredential),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Settings for the structured generation client.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    pub api_base: String,
    /// Total attempts per call (transport and parse failures share the budget).
    pub max_retries: u32,
    /// Backoff before retry `n` (0-based) is `base_delay * 2^n`.
    pub base_delay: Duration,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Transport-level request timeout.
    pub request_timeout: Duration,
    /// Extra stage calls after a validation failure. 0 = report immediately.
    pub validation_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            temperature: 0.7,
            max_output_tokens: 4000,
            request_timeout: Duration::from_secs(120),
            validation_retries: 0,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model name is empty".into()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be within 0.0-2.0, got {}",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Invalid("max_output_tokens must be positive".into()));
        }
        Ok(())
    }

    /// Backoff before the retry that follows attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}
