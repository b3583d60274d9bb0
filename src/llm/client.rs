//! OpenAI-compatible chat-completions client

use super::invoker::ChatTransport;
use super::types::*;
use crate::auth::Credential;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Client bound to one endpoint and one bearer credential
pub struct OpenAiClient {
    http_client: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl OpenAiClient {
    /// Create a new client; no timeout is set beyond reqwest's default
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            credential,
        })
    }

    /// Full chat-completions URL for the configured base
    pub fn completions_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim().trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        )
    }

    /// Build headers for API requests
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut auth = HeaderValue::from_str(&self.credential.auth_header())
            .context("Invalid bearer token")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(headers)
    }
}

#[async_trait]
impl ChatTransport for OpenAiClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = self.completions_url();
        tracing::debug!("POST {} model={}", url, request.model);

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiErrorBody>(&error_text) {
                anyhow::bail!("API error ({}): {}", status, api_error.error.message);
            } else {
                anyhow::bail!("API error ({}): {}", status, error_text);
            }
        }

        response
            .json()
            .await
            .context("Failed to parse API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(base_url, Credential::new("tok-123")).unwrap()
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            client("https://dbc-1.cloud.databricks.com/serving-endpoints/").completions_url(),
            "https://dbc-1.cloud.databricks.com/serving-endpoints/chat/completions"
        );
        assert_eq!(
            client("http://localhost:8080/v1").completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_sends_bearer_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(serde_json::json!({
                "model": "t2t-bot",
                "messages": [{"role": "user", "content": "ping"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "pong"}}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&format!("{}/v1", server.uri()));
        let response = client
            .complete(&ChatCompletionRequest::single("t2t-bot", "ping"))
            .await
            .unwrap();

        assert_eq!(response.choices[0].message.content.as_deref(), Some("pong"));
        assert_eq!(response.usage, Some(Usage::new(1, 1, 2)));
    }

    #[tokio::test]
    async fn test_null_usage_counts_keep_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Hello"}}],
                "usage": {"prompt_tokens": 3, "completion_tokens": null, "total_tokens": null}
            })))
            .mount(&server)
            .await;

        let result = crate::llm::invoke(
            &format!("{}/v1", server.uri()),
            "m",
            "Hi",
            &Credential::new("tok-123"),
        )
        .await;
        assert_eq!(
            result,
            TestResult::success(
                "Hello",
                Some(Usage {
                    prompt_tokens: Some(3),
                    completion_tokens: None,
                    total_tokens: None,
                })
            )
        );
    }

    #[tokio::test]
    async fn test_api_error_message_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Invalid access token", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .complete(&ChatCompletionRequest::single("m", "hi"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "API error (401 Unauthorized): Invalid access token"
        );
    }

    #[tokio::test]
    async fn test_api_error_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .complete(&ChatCompletionRequest::single("m", "hi"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "API error (503 Service Unavailable): upstream unavailable"
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .complete(&ChatCompletionRequest::single("m", "hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse API response"));
    }
}
