//! Schema-constrained generation with bounded retries.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;
use wahlsim_core::{GenerationConfig, SchemaDescriptor};

use crate::transport::{CompletionRequest, Transport};
use crate::{GenerationError, TransportError};

/// Wraps a [`Transport`] with the retry policy.
///
/// Holds no state between calls beyond its configuration, so one client is
/// shared by every record in a batch.
#[derive(Clone)]
pub struct StructuredClient {
    transport: Arc<dyn Transport>,
    config: GenerationConfig,
}

enum AttemptError {
    Transport(TransportError),
    Parse(String),
}

impl StructuredClient {
    pub fn new(transport: Arc<dyn Transport>, config: GenerationConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Request a JSON object conforming to `schema`.
    ///
    /// Makes at most `max_retries` attempts. Transport failures back off for
    /// `base_delay * 2^attempt` before the next attempt; unparseable replies
    /// are retried straight away. Non-retryable transport errors end the call
    /// at once. The returned value is not validated against the schema.
    pub async fn call(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &SchemaDescriptor,
        max_output_tokens: u32,
    ) -> Result<Value, GenerationError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            schema: schema.clone(),
            temperature: self.config.temperature,
            max_output_tokens,
        };
        let max_attempts = self.config.max_retries.max(1);

        let mut attempt = 0u32;
        loop {
            let outcome = match self.transport.complete(&request).await {
                Ok(text) => parse_object(&text).map_err(AttemptError::Parse),
                Err(e) => Err(AttemptError::Transport(e)),
            };
            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let attempts = attempt + 1;

            match err {
                AttemptError::Parse(message) => {
                    warn!(
                        schema = schema.name,
                        attempt = attempts,
                        max_attempts,
                        error = %message,
                        "unparseable completion"
                    );
                    if attempts >= max_attempts {
                        return Err(GenerationError::Parse { attempts, message });
                    }
                }
                AttemptError::Transport(source) => {
                    warn!(
                        schema = schema.name,
                        attempt = attempts,
                        max_attempts,
                        error = %source,
                        "generation service call failed"
                    );
                    if attempts >= max_attempts || !source.is_retryable() {
                        return Err(GenerationError::Transport { attempts, source });
                    }
                    tokio::time::sleep(self.config.backoff(attempt)).await;
                }
            }
            attempt = attempts;
        }
    }
}

/// Parse the completion text as a JSON object. No type coercion.
fn parse_object(text: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use std::time::Duration;
    use wahlsim_core::schema;

    fn client(transport: Arc<ScriptedTransport>, retries: u32, delay_ms: u64) -> StructuredClient {
        StructuredClient::new(
            transport,
            GenerationConfig {
                max_retries: retries,
                base_delay: Duration::from_millis(delay_ms),
                ..Default::default()
            },
        )
    }

    fn unavailable() -> TransportError {
        TransportError::Server {
            status: 503,
            body: "overloaded".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_transport_failures() {
        let transport = Arc::new(ScriptedTransport::new(|_, call| match call {
            0 | 1 => Err(unavailable()),
            _ => Ok(r#"{"ok": true}"#.to_string()),
        }));
        let c = client(Arc::clone(&transport), 3, 1000);

        let value = c.call("s", "u", &schema::persona(), 100).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_with_backoff_and_last_error() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Err(unavailable())));
        let c = client(Arc::clone(&transport), 3, 1000);

        let start = tokio::time::Instant::now();
        let err = c.call("s", "u", &schema::persona(), 100).await.unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(transport.calls(), 3);
        assert_eq!(err.attempts(), 3);
        assert!(err.to_string().contains("503"));
        // 1s after attempt 1, 2s after attempt 2, none after the last.
        assert!(elapsed >= Duration::from_millis(3000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(7000), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn parse_failures_share_the_attempt_budget() {
        let transport = Arc::new(ScriptedTransport::new(|_, call| match call {
            0 => Ok("not json".to_string()),
            1 => Ok("[1, 2]".to_string()),
            _ => Ok(r#"{"third": 3}"#.to_string()),
        }));
        let c = client(Arc::clone(&transport), 3, 1000);

        let start = tokio::time::Instant::now();
        let value = c.call("s", "u", &schema::persona(), 100).await.unwrap();
        assert_eq!(value["third"], 3);
        assert_eq!(transport.calls(), 3);
        // Parse retries do not back off.
        assert!(start.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn parse_exhaustion_reports_parse_error() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| Ok("```json\n{}\n```".to_string())));
        let c = client(Arc::clone(&transport), 2, 0);
        let err = c.call("s", "u", &schema::persona(), 100).await.unwrap_err();
        assert!(matches!(err, GenerationError::Parse { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn authentication_failure_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(|_, _| {
            Err(TransportError::Server {
                status: 401,
                body: "invalid api key".into(),
            })
        }));
        let c = client(Arc::clone(&transport), 3, 0);
        let err = c.call("s", "u", &schema::persona(), 100).await.unwrap_err();
        assert_eq!(transport.calls(), 1);
        assert!(matches!(err, GenerationError::Transport { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn request_carries_config_and_limits() {
        let transport = Arc::new(ScriptedTransport::new(|req, _| {
            assert_eq!(req.model, "gpt-4o");
            assert_eq!(req.max_output_tokens, 1234);
            assert_eq!(req.schema.name, "judge_response");
            Ok("{}".to_string())
        }));
        let c = client(Arc::clone(&transport), 1, 0);
        let schema = schema::judge(&wahlsim_core::PartySet::default());
        c.call("s", "u", &schema, 1234).await.unwrap();
    }

    #[test]
    fn parse_object_rejects_non_objects() {
        assert!(parse_object("{}").is_ok());
        assert_eq!(
            parse_object("\"text\"").unwrap_err(),
            "expected a JSON object, got a string"
        );
        assert!(parse_object("").is_err());
    }
}
