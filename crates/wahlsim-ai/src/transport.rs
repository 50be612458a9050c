//! Outbound requests to an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use wahlsim_core::{ApiKey, SchemaDescriptor};

use crate::TransportError;

/// One structured-output request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub schema: SchemaDescriptor,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Sends a completion request and returns the raw generated text.
///
/// Implementations do not retry; [`StructuredClient`](crate::StructuredClient)
/// owns the retry policy.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;
}

/// HTTP transport for OpenAI's `/chat/completions` (or a compatible server).
pub struct OpenAiTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiTransport {
    /// `base_url` should be like `https://api.openai.com/v1` (no trailing
    /// slash needed). `timeout` bounds each HTTP request.
    pub fn new(base_url: &str, api_key: ApiKey, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

fn request_body(request: &CompletionRequest) -> Value {
    json!({
        "model": request.model,
        "messages": [
            { "role": "system", "content": request.system_prompt },
            { "role": "user", "content": request.user_prompt },
        ],
        "response_format": request.schema.response_format(),
        "temperature": request.temperature,
        "max_tokens": request.max_output_tokens,
    })
}

#[async_trait]
impl Transport for OpenAiTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let url = self.endpoint();
        debug!(url = %url, schema = request.schema.name, "sending completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&request_body(request))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = resp.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(TransportError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wahlsim_core::schema;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".into(),
            system_prompt: "system".into(),
            user_prompt: "user".into(),
            schema: schema::persona(),
            temperature: 0.7,
            max_output_tokens: 4000,
        }
    }

    #[test]
    fn body_carries_schema_and_limits() {
        let body = request_body(&request());
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["response_format"]["json_schema"]["name"], "persona");
    }

    #[test]
    fn transport_trims_trailing_slash() {
        let key = ApiKey::new(Some("sk-test".into())).unwrap();
        let transport =
            OpenAiTransport::new("https://api.openai.com/v1/", key, Duration::from_secs(5)).unwrap();
        assert_eq!(transport.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn completion_envelope_parses() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        let parsed: ChatCompletion = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(r#"{"a":1}"#));
    }
}
