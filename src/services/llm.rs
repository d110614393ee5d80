// src/services/llm.rs
//! Groq chat-completions client (OpenAI-compatible wire format).

use crate::services::settings::SettingsService;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Settings error: {0}")]
    SettingsError(String),
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub fallback_model: String,
}

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_FALLBACK_MODEL: &str = "llama-3.1-8b-instant";

/// What a completion is for; selects sampling parameters and output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPurpose {
    /// Conversational tutor recommendations
    TutorChat,
    /// Ranking a candidate list, JSON output
    TutorRanking,
    /// Naming a neighbourhood from a geocoded address
    ZoneNaming,
}

impl CompletionPurpose {
    fn temperature(&self) -> f32 {
        match self {
            CompletionPurpose::TutorChat => 0.6,
            CompletionPurpose::TutorRanking => 0.2,
            CompletionPurpose::ZoneNaming => 0.0,
        }
    }

    fn max_tokens(&self) -> u32 {
        match self {
            CompletionPurpose::TutorChat => 1024,
            CompletionPurpose::TutorRanking => 2048,
            CompletionPurpose::ZoneNaming => 64,
        }
    }

    fn wants_json(&self) -> bool {
        matches!(self, CompletionPurpose::TutorRanking)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

impl ChatCompletionResponse {
    pub(crate) fn into_text(self) -> Result<String, LlmError> {
        let text = self
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse("Empty completion".to_string()));
        }
        Ok(text)
    }
}

/// Completion text plus the model that produced it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub model: String,
}

#[derive(Debug)]
pub struct LlmService {
    settings_service: Arc<SettingsService>,
    client: Client,
}

impl LlmService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings_service,
            client,
        }
    }

    /// Get Groq configuration from settings
    pub async fn get_config(&self) -> Result<LlmConfig, LlmError> {
        let settings_err = |e: crate::services::settings::SettingsError| {
            LlmError::SettingsError(e.to_string())
        };

        let api_key = self
            .settings_service
            .get_setting("groq_api_key")
            .await
            .map_err(settings_err)?
            .ok_or(LlmError::NotConfigured)?;

        Ok(LlmConfig {
            api_key,
            base_url: self
                .settings_service
                .get_or("groq_base_url", DEFAULT_BASE_URL)
                .await
                .map_err(settings_err)?,
            model: self
                .settings_service
                .get_or("groq_model", DEFAULT_MODEL)
                .await
                .map_err(settings_err)?,
            fallback_model: self
                .settings_service
                .get_or("groq_fallback_model", DEFAULT_FALLBACK_MODEL)
                .await
                .map_err(settings_err)?,
        })
    }

    /// Run a completion on the primary model
    pub async fn complete(
        &self,
        purpose: CompletionPurpose,
        messages: &[ChatMessage],
    ) -> Result<Completion, LlmError> {
        let config = self.get_config().await?;
        self.complete_with_model(&config, &config.model, purpose, messages)
            .await
    }

    /// Run a completion on the primary model, retrying exactly once on the
    /// smaller fallback model when the first call fails.
    pub async fn complete_with_fallback(
        &self,
        purpose: CompletionPurpose,
        messages: &[ChatMessage],
    ) -> Result<Completion, LlmError> {
        let config = self.get_config().await?;

        match self
            .complete_with_model(&config, &config.model, purpose, messages)
            .await
        {
            Ok(completion) => Ok(completion),
            Err(primary_error) => {
                warn!(
                    error = %primary_error,
                    primary_model = %config.model,
                    fallback_model = %config.fallback_model,
                    "Primary model failed, trying fallback model"
                );
                self.complete_with_model(&config, &config.fallback_model, purpose, messages)
                    .await
            }
        }
    }

    async fn complete_with_model(
        &self,
        config: &LlmConfig,
        model: &str,
        purpose: CompletionPurpose,
        messages: &[ChatMessage],
    ) -> Result<Completion, LlmError> {
        let request = ChatCompletionRequest {
            model,
            messages,
            temperature: purpose.temperature(),
            max_tokens: purpose.max_tokens(),
            response_format: purpose
                .wants_json()
                .then(|| serde_json::json!({"type": "json_object"})),
        };

        let url = format!(
            "{}/v1/chat/completions",
            config.base_url.trim_end_matches('/')
        );

        debug!(purpose = ?purpose, model = %model, messages = messages.len(), "Sending Groq completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, model = %model, "Groq API request failed");
            return Err(LlmError::RequestFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if let Some(usage) = &body.usage {
            info!(
                purpose = ?purpose,
                model = %model,
                tokens_used = usage.total_tokens,
                "Groq completion finished"
            );
        }

        Ok(Completion {
            text: body.into_text()?,
            model: model.to_string(),
        })
    }
}
