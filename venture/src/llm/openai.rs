//! OpenAI-compatible chat-completion client (works with OpenAI and OpenRouter)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::{GenerationClient, GenerationClientInfo};
use crate::config::LlmSettings;
use crate::error::GenerationError;
use crate::prompt::Prompt;

/// Upstream error bodies are cut to this many characters in errors and logs.
const MAX_ERROR_BODY_CHARS: usize = 1000;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiGenerationClient {
    settings: LlmSettings,
    base_url: String,
    client: Client,
}

impl OpenAiGenerationClient {
    pub fn new(settings: LlmSettings) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| {
                GenerationError::Unavailable(format!("Failed to create HTTP client: {}", e))
            })?;
        let base_url = settings.resolved_base_url();

        Ok(Self {
            settings,
            base_url,
            client,
        })
    }
}

#[async_trait]
impl GenerationClient for OpenAiGenerationClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            GenerationError::Unavailable("API key required for OpenAI provider".to_string())
        })?;
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(
            model = %self.settings.model,
            system_chars = prompt.system.len(),
            user_chars = prompt.user.len(),
            "Sending generation request"
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body: truncate(&body),
            });
        }

        let raw_body = response.text().await?;
        let response_body: ChatResponse = serde_json::from_str(&raw_body).map_err(|e| {
            GenerationError::MalformedOutcome(format!(
                "unexpected chat completion response ({}): {}",
                e,
                truncate(&raw_body)
            ))
        })?;

        let choice = response_body
            .choices
            .into_iter()
            .next()
            .ok_or(GenerationError::NoContent)?;

        match choice.finish_reason.as_deref() {
            Some("length") => warn!(
                max_tokens = ?self.settings.max_tokens,
                "LLM response was truncated (finish_reason: length)"
            ),
            Some("content_filter") => {
                warn!("LLM response was stopped by content filter")
            }
            _ => {}
        }

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Generation request completed"
        );

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(GenerationError::NoContent),
        }
    }

    fn info(&self) -> GenerationClientInfo {
        GenerationClientInfo {
            provider: self.settings.provider.as_str().to_string(),
            model: self.settings.model.clone(),
        }
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        format!(
            "{}... [truncated]",
            body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>()
        )
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Tone;

    #[test]
    fn test_request_shape() {
        let prompt = Prompt {
            year: 1,
            tone: Tone::Realistic,
            system: "sys".to_string(),
            user: "usr".to_string(),
        };
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: Some(0.7),
            max_tokens: None,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "usr");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_null_content_is_parsed_as_missing() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert!(response.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = OpenAiGenerationClient::new(LlmSettings::default()).unwrap();
        let prompt = Prompt {
            year: 1,
            tone: Tone::Realistic,
            system: String::new(),
            user: String::new(),
        };
        let result = client.generate(&prompt).await;
        assert!(matches!(result, Err(GenerationError::Unavailable(_))));
    }

    #[test]
    fn test_truncate_long_body() {
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 50);
        assert!(truncate(&long).ends_with("[truncated]"));
        assert_eq!(truncate("short"), "short");
    }
}
