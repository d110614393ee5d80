// src/services/gemini.rs
//! Gemini `generateContent` client for bio writing and ID-card reading.

use crate::services::settings::SettingsService;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Settings error: {0}")]
    SettingsError(String),
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Inline image passed alongside the prompt
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub(crate) fn into_text(self) -> Result<String, GeminiError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GeminiError::InvalidResponse(
                "No text in response candidates".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Debug)]
pub struct GeminiService {
    settings_service: Arc<SettingsService>,
    client: Client,
}

impl GeminiService {
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

    pub async fn get_config(&self) -> Result<GeminiConfig, GeminiError> {
        let settings_err =
            |e: crate::services::settings::SettingsError| GeminiError::SettingsError(e.to_string());

        let api_key = self
            .settings_service
            .get_setting("gemini_api_key")
            .await
            .map_err(settings_err)?
            .ok_or(GeminiError::NotConfigured)?;

        Ok(GeminiConfig {
            api_key,
            base_url: self
                .settings_service
                .get_or("gemini_base_url", DEFAULT_BASE_URL)
                .await
                .map_err(settings_err)?,
            model: self
                .settings_service
                .get_or("gemini_model", DEFAULT_MODEL)
                .await
                .map_err(settings_err)?,
        })
    }

    /// Plain text generation
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate(prompt, None, false).await
    }

    /// Vision prompt over one image, asking for a JSON reply
    pub async fn analyze_image_json(
        &self,
        prompt: &str,
        image: InlineImage,
    ) -> Result<String, GeminiError> {
        self.generate(prompt, Some(image), true).await
    }

    async fn generate(
        &self,
        prompt: &str,
        image: Option<InlineImage>,
        json_output: bool,
    ) -> Result<String, GeminiError> {
        let config = self.get_config().await?;

        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];
        let has_image = image.is_some();
        if let Some(image) = image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type,
                    data: base64::engine::general_purpose::STANDARD.encode(&image.data),
                },
            });
        }

        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: if json_output { 0.0 } else { 0.7 },
                response_mime_type: json_output.then(|| "application/json".to_string()),
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        debug!(model = %config.model, has_image = has_image, "Sending Gemini generateContent request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Gemini API request failed");
            return Err(GeminiError::RequestFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiError::InvalidResponse(e.to_string()))?;

        let text = body.into_text()?;
        info!(model = %config.model, has_image = has_image, "Gemini generation completed");
        Ok(text)
    }
}
