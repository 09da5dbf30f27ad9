//! Gemini API client.
//!
//! The core only depends on the [`CommandModel`] capability: given a video
//! and a structured prompt, return text. Validation and correlation stay
//! fully unit-testable without network access; retries live in the
//! orchestrator, so this client performs exactly one request per call with
//! an explicit timeout.

use crate::{Error, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Determinism and sampling controls for one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Video sampling rate the model should observe
    pub fps: f64,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    /// Output-length cap in tokens
    pub max_output_tokens: u32,
    /// Hard deadline for the request
    pub timeout: Duration,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            fps: 0.8,
            temperature: 0.2,
            top_k: 3,
            top_p: 0.8,
            max_output_tokens: 6000,
            timeout: Duration::from_secs(400),
        }
    }
}

/// The external generative capability: video + prompt + options → text.
pub trait CommandModel {
    fn generate(
        &self,
        video_path: &Path,
        prompt: &str,
        options: &GenerateOptions,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// Gemini wire format (field names match the REST API exactly)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GeminiRequest {
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
    Video {
        inline_data: InlineData,
        video_metadata: VideoSettings,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct VideoSettings {
    fps: f64,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u64>,
}

/// Gemini-backed implementation of [`CommandModel`].
pub struct GeminiClient {
    /// Base endpoint up to and including `/models`
    pub endpoint: String,
    /// Model identifier, e.g. `gemini-1.5-flash`
    pub model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client reading the key from `GEMINI_API_KEY` or
    /// `GOOGLE_API_KEY`.
    pub fn new(model: &str) -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .ok();
        Self::with_key(model, api_key)
    }

    /// Create a client with an explicit key (or none, for offline tests)
    pub fn with_key(model: &str, api_key: Option<String>) -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: model.to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Check if an API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request(&self, video_path: &Path, prompt: &str, options: &GenerateOptions) -> Result<GeminiRequest> {
        let video_bytes = std::fs::read(video_path)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&video_bytes);
        debug!(
            "encoded {} ({} bytes) for upload",
            video_path.display(),
            video_bytes.len()
        );

        Ok(GeminiRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::Video {
                        inline_data: InlineData {
                            mime_type: mime_type_for(video_path).to_string(),
                            data: encoded,
                        },
                        video_metadata: VideoSettings { fps: options.fps },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_k: options.top_k,
                top_p: options.top_p,
                max_output_tokens: options.max_output_tokens,
                response_mime_type: "text/plain".to_string(),
            },
        })
    }

    fn extract_text(response: GeminiResponse) -> Result<String> {
        if let Some(usage) = &response.usage_metadata {
            if let Some(tokens) = usage.total_token_count {
                info!("generation used {} tokens", tokens);
            }
        }

        let text: String = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::ExternalCall {
                attempts: 1,
                message: "model returned an empty response".to_string(),
            });
        }
        Ok(trimmed.to_string())
    }
}

impl CommandModel for GeminiClient {
    async fn generate(
        &self,
        video_path: &Path,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| Error::ExternalCall {
            attempts: 1,
            message: "GEMINI_API_KEY or GOOGLE_API_KEY not set".to_string(),
        })?;

        let request = self.build_request(video_path, prompt, options)?;
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        debug!("calling {} with prompt of {} chars", self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "request timed out" } else { "request failed" };
                Error::ExternalCall {
                    attempts: 1,
                    message: format!("{}: {}", reason, e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API error: HTTP {}", status);
            return Err(Error::ExternalCall {
                attempts: 1,
                message: format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
            });
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| Error::ExternalCall {
            attempts: 1,
            message: format!("unparseable response: {}", e),
        })?;

        Self::extract_text(parsed)
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        _ => "video/mp4",
    }
}
