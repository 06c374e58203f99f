//! Generation clients: the external chat-completion boundary.
//!
//! The driver only sees [`GenerationClient`]. A call takes a [`Prompt`] and
//! returns the raw message content, which [`parse_outcome`] turns into a
//! checked [`YearOutcome`].

pub mod openai;
pub mod stub;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::config::{LlmSettings, ProviderKind};
use crate::error::GenerationError;
use crate::model::YearOutcome;
use crate::prompt::Prompt;

pub use openai::OpenAiGenerationClient;
pub use stub::StubGenerationClient;

/// Abstract interface for the generation call
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send the prompt and return the message content, which must be a JSON
    /// object encoded as a string.
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError>;

    /// Get provider information
    fn info(&self) -> GenerationClientInfo;
}

/// Information about a generation client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationClientInfo {
    pub provider: String,
    pub model: String,
}

/// Create a generation client based on configuration.
///
/// The stub client is refused unless `allow_stub` is set.
pub fn create_client(
    settings: &LlmSettings,
    allow_stub: bool,
) -> Result<Arc<dyn GenerationClient>, GenerationError> {
    match settings.provider {
        ProviderKind::Stub => {
            if !allow_stub {
                return Err(GenerationError::Unavailable(
                    "the stub provider is for testing only; set VENTURE_ALLOW_STUB_PROVIDER=1 \
                     or pass --allow-stub to enable it"
                        .to_string(),
                ));
            }
            warn!("Using stub generation client (testing only - not realistic)");
            Ok(Arc::new(StubGenerationClient::new()))
        }
        ProviderKind::OpenAi | ProviderKind::OpenRouter => {
            Ok(Arc::new(OpenAiGenerationClient::new(settings.clone())?))
        }
    }
}

/// Parse and check the message content of one generation call.
pub fn parse_outcome(content: &str) -> Result<YearOutcome, GenerationError> {
    let json_text = strip_code_fence(content);
    if json_text.is_empty() {
        return Err(GenerationError::NoContent);
    }
    let outcome: YearOutcome = serde_json::from_str(json_text)?;
    outcome
        .check()
        .map_err(|e| GenerationError::InvalidOutcome(e.to_string()))?;
    Ok(outcome)
}

/// Strip a surrounding Markdown code block if present.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return trimmed,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}
