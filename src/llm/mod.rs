//! Generation client integration.
//!
//! Supports:
//! - **OpenAI-compatible** chat completions over reqwest
//! - **Mock**: scripted offline responses, used when no API key is set
//!
//! Everything downstream talks to the [`LlmProvider`] trait only.

pub mod mock;
pub mod openai;
pub mod provider;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
    Mock,
}

/// Configuration for creating a provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: Option<secrecy::SecretString>,
    pub base_url: String,
    pub model: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

/// Create a provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match (config.backend, &config.api_key) {
        (LlmBackend::OpenAi, Some(key)) => {
            let provider = OpenAiProvider::new(
                key.clone(),
                &config.base_url,
                &config.model,
                config.timeout,
            )?;
            tracing::info!("Using OpenAI-compatible endpoint (model: {})", config.model);
            Ok(Arc::new(provider))
        }
        (LlmBackend::OpenAi, None) => Err(LlmError::AuthFailed {
            provider: "openai".to_string(),
        }),
        (LlmBackend::Mock, _) => {
            tracing::info!("Using mock generation client (no LLM_API_KEY set)");
            Ok(Arc::new(MockProvider::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: LlmBackend, key: Option<&str>) -> LlmConfig {
        LlmConfig {
            backend,
            api_key: key.map(secrecy::SecretString::from),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_create_openai_provider() {
        let provider = create_provider(&config(LlmBackend::OpenAi, Some("sk-test")));
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "gpt-4");
    }

    #[test]
    fn test_openai_without_key_fails() {
        let provider = create_provider(&config(LlmBackend::OpenAi, None));
        assert!(matches!(provider, Err(LlmError::AuthFailed { .. })));
    }

    #[test]
    fn test_mock_backend() {
        let provider = create_provider(&config(LlmBackend::Mock, None)).unwrap();
        assert_eq!(provider.model_name(), "mock");
    }
}
