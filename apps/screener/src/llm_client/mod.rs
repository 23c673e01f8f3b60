/// LLM Client — the single point of entry for all hosted language-model calls.
///
/// No other module may call the Cohere API directly.
///
/// Model: command-r-plus (hardcoded so feedback stays comparable between runs)
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;
#[cfg(test)]
pub(crate) mod stub_server;

const COHERE_CHAT_URL: &str = "https://api.cohere.ai/v1/chat";
/// The model used for all LLM calls.
pub const MODEL: &str = "command-r-plus";
const TEMPERATURE: f32 = 0.3;
const MAX_RETRIES: u32 = 3;
const BACKOFF_BASE_MS: u64 = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited on all {retries} attempts")]
    RateLimited { retries: u32 },

    #[error("Unexpected response format from Cohere API")]
    UnexpectedFormat,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    temperature: f32,
}

/// Chat response body. Newer deployments answer with `text`; legacy ones with `generations`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub generations: Vec<Generation>,
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Deserialize)]
pub struct Generation {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub billed_units: Option<BilledUnits>,
}

#[derive(Debug, Deserialize)]
pub struct BilledUnits {
    #[serde(default)]
    pub input_tokens: f64,
    #[serde(default)]
    pub output_tokens: f64,
}

impl ChatResponse {
    /// Trimmed reply text: `text` first, then the first generation.
    pub fn reply(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or_else(|| self.generations.first().and_then(|g| g.text.as_deref()))
            .map(str::trim)
    }
}

#[derive(Debug, Deserialize)]
struct CohereError {
    message: String,
}

/// Wraps the Cohere chat endpoint with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    backoff_base: Duration,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_endpoint(
            api_key,
            COHERE_CHAT_URL.to_string(),
            Duration::from_millis(BACKOFF_BASE_MS),
        )
    }

    /// Client for another chat endpoint, with its own first backoff step.
    pub(crate) fn with_endpoint(
        api_key: String,
        endpoint: String,
        backoff_base: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key,
            endpoint,
            backoff_base,
        })
    }

    /// Waits before retry number `attempt` (1-based): base, then double each time.
    async fn backoff(&self, attempt: u32) {
        let delay = backoff_delay(self.backoff_base, attempt);
        warn!(
            "LLM call attempt {} failed, retrying after {}ms...",
            attempt,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }

    /// Makes a raw chat call, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, message: &str) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            message,
            temperature: TEMPERATURE,
        };

        let mut last_error = LlmError::RateLimited {
            retries: MAX_RETRIES,
        };

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                self.backoff(attempt).await;
            }

            let response = self
                .client
                .post(self.endpoint.as_str())
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = LlmError::Http(e);
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                };
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }

            let chat_response: ChatResponse = response.json().await?;

            if let Some(units) = chat_response
                .meta
                .as_ref()
                .and_then(|m| m.billed_units.as_ref())
            {
                debug!(
                    "LLM call succeeded: input_tokens={}, output_tokens={}",
                    units.input_tokens, units.output_tokens
                );
            }

            return Ok(chat_response);
        }

        // a final 429 means the quota never recovered
        Err(match last_error {
            LlmError::Api { status: 429, .. } => LlmError::RateLimited {
                retries: MAX_RETRIES,
            },
            other => other,
        })
    }

    /// Calls the model and returns only the reply text.
    pub async fn call_text(&self, message: &str) -> Result<String, LlmError> {
        let response = self.call(message).await?;
        extract_reply(&response)
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * (1u32 << attempt.saturating_sub(1))
}

fn extract_reply(response: &ChatResponse) -> Result<String, LlmError> {
    response
        .reply()
        .filter(|t| !t.is_empty())
        .map(String::from)
        .ok_or(LlmError::UnexpectedFormat)
}

/// Pulls `message` out of a Cohere error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<CohereError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::stub_server::StubServer;
    use super::*;

    const OK_BODY: &str = r#"{"text": "Score: 81/100", "meta": {"billed_units": {"input_tokens": 10, "output_tokens": 4}}}"#;
    const SLOW_DOWN: &str = r#"{"message": "too many requests"}"#;
    const UNAVAILABLE: &str = r#"{"message": "upstream unavailable"}"#;

    fn stub_client(server: &StubServer) -> LlmClient {
        LlmClient::with_endpoint(
            "test-key".to_string(),
            server.endpoint(),
            Duration::from_millis(5),
        )
        .unwrap()
    }

    #[test]
    fn test_reply_prefers_text_field() {
        let json = r#"{"text": "  **Score: 82/100**  ", "generations": [{"text": "other"}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_reply(&response).unwrap(), "**Score: 82/100**");
    }

    #[test]
    fn test_reply_falls_back_to_generations() {
        let json = r#"{"generations": [{"text": "\nScore: 70/100\n"}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_reply(&response).unwrap(), "Score: 70/100");
    }

    #[test]
    fn test_reply_missing_is_unexpected_format() {
        let response: ChatResponse = serde_json::from_str(r#"{"generations": []}"#).unwrap();
        assert!(matches!(
            extract_reply(&response),
            Err(LlmError::UnexpectedFormat)
        ));
    }

    #[test]
    fn test_billed_units_deserialize() {
        let json = r#"{"text": "ok", "meta": {"billed_units": {"input_tokens": 512, "output_tokens": 88}}}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let units = response.meta.unwrap().billed_units.unwrap();
        assert_eq!(units.input_tokens, 512.0);
        assert_eq!(units.output_tokens, 88.0);
    }

    #[test]
    fn test_error_message_parses_cohere_body() {
        assert_eq!(error_message(r#"{"message": "invalid api token"}"#), "invalid api token");
        assert_eq!(error_message("plain failure"), "plain failure");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(ChatRequest {
            model: MODEL,
            message: "hello",
            temperature: TEMPERATURE,
        })
        .unwrap();
        assert_eq!(body["model"], "command-r-plus");
        assert_eq!(body["message"], "hello");
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_backoff_doubles_from_one_second() {
        let base = Duration::from_millis(BACKOFF_BASE_MS);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_sleeps_on_the_tokio_clock() {
        let client = LlmClient::new("key".to_string()).unwrap();
        let start = tokio::time::Instant::now();
        client.backoff(1).await;
        let first = start.elapsed();
        assert!(first >= Duration::from_secs(1) && first < Duration::from_millis(1010));
        client.backoff(2).await;
        let total = start.elapsed();
        assert!(total >= Duration::from_secs(3) && total < Duration::from_millis(3020));
    }

    #[tokio::test]
    async fn test_rate_limit_retried_until_success() {
        let server = StubServer::start(vec![(429, SLOW_DOWN), (429, SLOW_DOWN), (200, OK_BODY)]).await;
        let reply = stub_client(&server).call_text("review this").await.unwrap();
        assert_eq!(reply, "Score: 81/100");
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_attempts() {
        let server =
            StubServer::start(vec![(500, UNAVAILABLE), (500, UNAVAILABLE), (500, UNAVAILABLE)]).await;
        let err = stub_client(&server).call("review this").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_reports_rate_limited() {
        let server = StubServer::start(vec![(429, SLOW_DOWN), (429, SLOW_DOWN), (429, SLOW_DOWN)]).await;
        let err = stub_client(&server).call("review this").await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { retries: 3 }));
        assert_eq!(server.hits(), 3);
    }

    #[tokio::test]
    async fn test_unauthorized_is_not_retried() {
        let server = StubServer::start(vec![
            (401, r#"{"message": "invalid api token"}"#),
            (200, OK_BODY),
        ])
        .await;
        let err = stub_client(&server).call("review this").await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api token");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_server_error_then_empty_reply_is_unexpected_format() {
        let server = StubServer::start(vec![(503, UNAVAILABLE), (200, r#"{"generations": []}"#)]).await;
        let err = stub_client(&server).call_text("review this").await.unwrap_err();
        assert!(matches!(err, LlmError::UnexpectedFormat));
        assert_eq!(server.hits(), 2);
    }
}
