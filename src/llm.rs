//! Structured-output calls to the LLM provider.
//!
//! [`StructuredGenerator`] is the seam the extraction client talks to;
//! [`GeminiClient`] implements it against the Gemini `generateContent` REST
//! endpoint with a JSON response schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::error::{InsightError, Result};

/// One constrained generation call returning the provider's raw JSON object.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Send `contents` under `system_instruction`, requiring output that
    /// conforms to `response_schema`.
    async fn generate(&self, system_instruction: &str, contents: &str, response_schema: &Value) -> Result<Value>;

    /// Model identifier, for logging
    fn model(&self) -> String;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Gemini REST client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client from configuration.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!("Gemini client initialized (model: {})", config.model);

        Ok(Self {
            client,
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl StructuredGenerator for GeminiClient {
    async fn generate(&self, system_instruction: &str, contents: &str, response_schema: &Value) -> Result<Value> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system_instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: contents }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema,
            },
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(InsightError::Llm(format!("Gemini API error {status}: {body}")));
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| InsightError::MalformedOutput(format!("unreadable Gemini response: {e}")))?;

        let text = extract_text(parsed)?;
        debug!(chars = text.len(), "received structured response");
        parse_json_object(&text)
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| InsightError::MalformedOutput("response contained no candidates".to_string()))?;

    let finish_reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(InsightError::MalformedOutput(format!(
            "candidate had no text (finish reason: {finish_reason})"
        )));
    }
    Ok(text)
}

/// Parse model text into a JSON object, rejecting anything else.
pub fn parse_json_object(text: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| InsightError::MalformedOutput(e.to_string()))?;
    if !value.is_object() {
        return Err(InsightError::MalformedOutput("expected a JSON object".to_string()));
    }
    Ok(value)
}
