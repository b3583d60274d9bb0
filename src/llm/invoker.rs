//! Single-shot test invocation
//!
//! `invoke` never returns an error: every failure along the way is folded into
//! `TestResult::Failure`.

use anyhow::Result;
use async_trait::async_trait;

use super::client::OpenAiClient;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, TestResult};
use crate::auth::Credential;

/// Something that can answer a chat-completion request
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse>;
}

/// Send `message` to the agent at `endpoint` and normalize the outcome
pub async fn invoke(
    endpoint: &str,
    model: &str,
    message: &str,
    credential: &Credential,
) -> TestResult {
    let client = match OpenAiClient::new(endpoint, credential.clone()) {
        Ok(client) => client,
        Err(e) => return TestResult::failure(format!("{:#}", e)),
    };
    invoke_with(&client, model, message).await
}

/// Run one request through `transport` and normalize the outcome
pub async fn invoke_with<T: ChatTransport + ?Sized>(
    transport: &T,
    model: &str,
    message: &str,
) -> TestResult {
    let request = ChatCompletionRequest::single(model, message);

    let result = match transport.complete(&request).await {
        Ok(response) => normalize(response),
        Err(e) => TestResult::failure(format!("{:#}", e)),
    };

    match &result {
        TestResult::Success { usage, .. } => {
            tracing::info!("Invocation of model {} succeeded (usage: {:?})", model, usage)
        }
        TestResult::Failure { error } => {
            tracing::warn!("Invocation of model {} failed: {}", model, error)
        }
    }
    result
}

/// Map a provider response onto a `TestResult`
fn normalize(response: ChatCompletionResponse) -> TestResult {
    let Some(choice) = response.choices.into_iter().next() else {
        return TestResult::failure("API response contained no choices");
    };
    TestResult::success(choice.message.content.unwrap_or_default(), response.usage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{Choice, ResponseMessage, Usage};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Transport returning a canned outcome and recording requests
    struct FakeTransport {
        outcome: std::result::Result<ChatCompletionResponse, String>,
        seen: Mutex<Vec<ChatCompletionRequest>>,
    }

    impl FakeTransport {
        fn replying(content: Option<&str>, usage: Option<Usage>) -> Self {
            Self::with(Ok(ChatCompletionResponse {
                choices: vec![Choice {
                    message: ResponseMessage {
                        content: content.map(str::to_string),
                    },
                }],
                usage,
            }))
        }

        fn failing(error: &str) -> Self {
            Self::with(Err(error.to_string()))
        }

        fn with(outcome: std::result::Result<ChatCompletionResponse, String>) -> Self {
            Self {
                outcome,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn complete(
            &self,
            request: &ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcome.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[tokio::test]
    async fn test_success_with_usage() {
        let usage = Usage::new(3, 2, 5);
        let transport = FakeTransport::replying(Some("Hello"), Some(usage));

        let result = invoke_with(&transport, "t2t-bot", "Hi").await;
        assert_eq!(result, TestResult::success("Hello", Some(usage)));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ChatCompletionRequest::single("t2t-bot", "Hi"));
    }

    #[tokio::test]
    async fn test_success_without_usage() {
        let transport = FakeTransport::replying(Some("Hello"), None);
        match invoke_with(&transport, "m", "Hi").await {
            TestResult::Success { content, usage } => {
                assert_eq!(content, "Hello");
                assert!(usage.is_none());
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failure() {
        let transport = FakeTransport::failing("connection refused");
        match invoke_with(&transport, "m", "Hi").await {
            TestResult::Failure { error } => assert_eq!(error, "connection refused"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_error_message_still_reported() {
        let transport = FakeTransport::failing("");
        match invoke_with(&transport, "m", "Hi").await {
            TestResult::Failure { error } => assert!(!error.is_empty()),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_choices_is_failure() {
        let transport = FakeTransport::with(Ok(ChatCompletionResponse {
            choices: Vec::new(),
            usage: None,
        }));
        let result = invoke_with(&transport, "m", "Hi").await;
        assert_eq!(
            result,
            TestResult::failure("API response contained no choices")
        );
    }

    #[tokio::test]
    async fn test_null_content_is_empty_success() {
        let transport = FakeTransport::replying(None, None);
        assert_eq!(
            invoke_with(&transport, "m", "Hi").await,
            TestResult::success("", None)
        );
    }

    #[tokio::test]
    async fn test_invoke_unreachable_endpoint() {
        // Nothing listens on port 9 locally
        let result = invoke("http://127.0.0.1:9/v1", "m", "Hi", &Credential::new("t")).await;
        match result {
            TestResult::Failure { error } => assert!(error.contains("Failed to send request")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invoke_malformed_endpoint() {
        let result = invoke("not a url", "m", "Hi", &Credential::new("t")).await;
        assert!(!result.is_success());
    }
}
