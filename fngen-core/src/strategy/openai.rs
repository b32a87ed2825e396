//! OpenAI-compatible chat completions strategy
//!
//! Works with OpenAI, the Llama API, and any service exposing the same
//! `/chat/completions` shape. Failures are classified but never retried.

use super::GenerationStrategy;
use crate::config::BackendConfig;
use crate::errors::GenerationError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Strategy backed by an OpenAI-compatible HTTP API
pub struct OpenAiCompatStrategy {
    client: Client,
    config: BackendConfig,
    api_key: String,
}

impl OpenAiCompatStrategy {
    /// Build from configuration, reading the API key from the environment
    pub fn new(config: BackendConfig) -> Result<Self, GenerationError> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Build with an explicit API key
    pub fn with_api_key(
        config: BackendConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::auth("API key cannot be null or empty"));
        }
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self { client, config, api_key })
    }

    /// OpenAI with the default model
    pub fn openai() -> Result<Self, GenerationError> {
        Self::new(BackendConfig::openai())
    }

    /// Llama API with the default model
    pub fn llama() -> Result<Self, GenerationError> {
        Self::new(BackendConfig::llama())
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            top_p: self.config.top_p,
        }
    }
}

#[async_trait]
impl GenerationStrategy for OpenAiCompatStrategy {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn generate_function_output(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(provider = %self.config.provider, model = %self.config.model, "Sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| classify_transport_error(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            let err = classify_error_response(status, &body, retry_after);
            warn!(provider = %self.config.provider, transient = err.is_transient(), "{}", err);
            return Err(err);
        }

        let body: ChatCompletionResponse = response.json().await?;
        extract_content(body, &self.config.provider)
    }
}

fn classify_transport_error(err: reqwest::Error, timeout_secs: Option<u64>) -> GenerationError {
    if err.is_timeout() {
        if let Some(secs) = timeout_secs {
            return GenerationError::Timeout { duration: Duration::from_secs(secs) };
        }
    }
    GenerationError::from(err)
}

/// Map a non-success reply to a typed error.
///
/// Understands both `{"error": "type", "message": "..."}` and the
/// `{"error": {"message": "...", "type": "..."}}` shape.
fn classify_error_response(
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> GenerationError {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => error_message(&json).unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::auth(message),
        StatusCode::TOO_MANY_REQUESTS => GenerationError::rate_limit(message, retry_after),
        _ => GenerationError::api(status.as_u16(), message),
    }
}

fn error_message(json: &Value) -> Option<String> {
    let error = json.get("error")?;
    match error {
        Value::Object(details) => {
            let message = details.get("message").and_then(Value::as_str)?;
            match details.get("type").and_then(Value::as_str) {
                Some(kind) => Some(format!("{} ({})", message, kind)),
                None => Some(message.to_string()),
            }
        }
        Value::String(kind) => {
            let message = json.get("message").and_then(Value::as_str)?;
            Some(format!("{} ({})", message, kind))
        }
        _ => json.get("message").and_then(Value::as_str).map(str::to_string),
    }
}

fn extract_content(
    response: ChatCompletionResponse,
    provider: &str,
) -> Result<String, GenerationError> {
    let choice = response.choices.into_iter().next().ok_or_else(|| {
        GenerationError::invalid_response(format!("{} response contained no choices", provider))
    })?;
    choice.message.content.ok_or_else(|| {
        GenerationError::invalid_response(format!("{} response contained no content", provider))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> OpenAiCompatStrategy {
        OpenAiCompatStrategy::with_api_key(BackendConfig::llama(), "test-key").unwrap()
    }

    #[test]
    fn test_endpoint_and_request_body() {
        let strategy = strategy();
        assert_eq!(strategy.endpoint(), "https://api.llama-api.com/chat/completions");
        assert_eq!(strategy.name(), "llama");

        let body = serde_json::to_value(strategy.request_body("do the thing")).unwrap();
        assert_eq!(body["model"], "llama3.1-70b");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "do the thing");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_construction_validates() {
        assert!(matches!(
            OpenAiCompatStrategy::with_api_key(BackendConfig::openai(), "  "),
            Err(GenerationError::Authentication { .. })
        ));

        let mut config = BackendConfig::openai();
        config.temperature = Some(-1.0);
        assert!(matches!(
            OpenAiCompatStrategy::with_api_key(config, "key"),
            Err(GenerationError::Configuration { .. })
        ));
    }

    #[test]
    fn test_classify_error_shapes() {
        let err = classify_error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error": "overloaded", "message": "try again later"}"#,
            None,
        );
        assert_eq!(err.to_string(), "API error (status 503): try again later (overloaded)");
        assert!(err.is_transient());

        let err = classify_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"error": {"message": "context too long", "type": "invalid_request_error"}}"#,
            None,
        );
        assert!(err.to_string().contains("context too long"));
        assert!(!err.is_transient());

        let err = classify_error_response(
            StatusCode::TOO_MANY_REQUESTS,
            "{}",
            Some(Duration::from_secs(5)),
        );
        match err {
            GenerationError::RateLimitExceeded { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(5)))
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = classify_error_response(StatusCode::UNAUTHORIZED, "nope", None);
        assert!(matches!(err, GenerationError::Authentication { .. }));
    }

    #[test]
    fn test_extract_content() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "\"olleh\""}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(response, "openai").unwrap(), "\"olleh\"");

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            extract_content(empty, "openai"),
            Err(GenerationError::InvalidResponse { .. })
        ));
    }
}
