//! Scripted provider used when no API key is configured, and in tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider, Role};

/// Response returned when no trigger matches.
pub const DEFAULT_MOCK_RESPONSE: &str = "===EMAIL===
Subject: Re: Your inquiry

Dear [Recipient Name],

Thank you for reading my note. I appreciate your time and would be glad to share more about my background.

I believe my experience aligns well with your team, and I would welcome the opportunity to discuss this further.

Would you be available for a brief call next week?

Best regards,
[Your Name]

===EVAL===
The draft keeps a professional tone, states its purpose clearly and ends with a specific call to action.";

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(String),
}

/// Provider that answers from a trigger table instead of the network.
///
/// A trigger matches when the user prompt contains it; the first matching
/// trigger wins, in insertion order.
pub struct MockProvider {
    replies: Mutex<Vec<(String, MockReply)>>,
    fallback: MockReply,
}

impl MockProvider {
    /// Provider that always returns [`DEFAULT_MOCK_RESPONSE`].
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            fallback: MockReply::Text(DEFAULT_MOCK_RESPONSE.to_string()),
        }
    }

    /// Provider that always returns `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            fallback: MockReply::Text(text.into()),
        }
    }

    /// Provider whose every call fails.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            fallback: MockReply::Fail(reason.into()),
        }
    }

    /// Answer `response` whenever the user prompt contains `trigger`.
    pub fn set_response(&self, trigger: impl Into<String>, response: impl Into<String>) {
        self.push(trigger.into(), MockReply::Text(response.into()));
    }

    /// Fail whenever the user prompt contains `trigger`.
    pub fn set_failure(&self, trigger: impl Into<String>, reason: impl Into<String>) {
        self.push(trigger.into(), MockReply::Fail(reason.into()));
    }

    /// Drop all scripted triggers.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, trigger: String, reply: MockReply) {
        debug!(trigger = %trigger, "Mock response configured");
        self.lock().push((trigger, reply));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, MockReply)>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let user_prompt = request.content_for(Role::User);
        debug!(
            user_len = user_prompt.len(),
            temperature = ?request.temperature,
            "Mock completion requested"
        );

        let reply = self
            .lock()
            .iter()
            .find(|(trigger, _)| user_prompt.contains(trigger.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            MockReply::Text(text) => Ok(CompletionResponse::text(text)),
            MockReply::Fail(reason) => Err(LlmError::RequestFailed {
                provider: "mock".into(),
                reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ChatMessage;

    fn request(user: &str) -> CompletionRequest {
        CompletionRequest::new(vec![ChatMessage::system("sys"), ChatMessage::user(user)])
    }

    #[tokio::test]
    async fn default_response_has_both_markers() {
        let provider = MockProvider::new();
        let response = provider.complete(request("anything")).await.unwrap();
        assert!(response.content.contains("===EMAIL==="));
        assert!(response.content.contains("===EVAL==="));
    }

    #[tokio::test]
    async fn trigger_overrides_default() {
        let provider = MockProvider::new();
        provider.set_response("referral", "custom");
        let hit = provider.complete(request("a referral email")).await.unwrap();
        assert_eq!(hit.content, "custom");
        let miss = provider.complete(request("a thankyou email")).await.unwrap();
        assert_ne!(miss.content, "custom");
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let provider = MockProvider::failing("down");
        let err = provider.complete(request("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed { .. }));
    }

    #[tokio::test]
    async fn clear_removes_triggers() {
        let provider = MockProvider::new();
        provider.set_failure("boom", "scripted");
        assert!(provider.complete(request("boom")).await.is_err());
        provider.clear();
        assert!(provider.complete(request("boom")).await.is_ok());
    }
}
