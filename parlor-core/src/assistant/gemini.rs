use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{AssistantClient, ReplyOptions};
use crate::config::AssistantConfig;
use crate::error::{ParlorError, ParlorResult};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Prefixes the system prompt the way the reply prompt has always been framed.
pub fn build_prompt(user_prompt: &str, system_prompt: Option<&str>) -> String {
    match system_prompt.map(str::trim).filter(|s| !s.is_empty()) {
        Some(system) => format!("{}\n\nUser: {}", system, user_prompt),
        None => user_prompt.to_string(),
    }
}

impl GeminiClient {
    pub fn new(config: &AssistantConfig) -> Self {
        if config.api_key.is_none() {
            warn!("Gemini API key missing; assistant replies will fail");
        }
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn with_api_key(api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: Some(api_key),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, key
        )
    }
}

#[async_trait]
impl AssistantClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn generate_reply(&self, prompt: &str, options: &ReplyOptions) -> ParlorResult<String> {
        let key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ParlorError::AssistantKeyMissing)?;

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart {
                    text: build_prompt(prompt, options.system_prompt.as_deref()),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: options.max_output_tokens,
                temperature: options.temperature,
            },
        };

        debug!(model = %self.model, "Requesting assistant reply");
        let response = self
            .client
            .post(self.endpoint(key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ParlorError::AssistantRequestFailed(e.to_string()))?;

        let status = response.status();
        let raw: serde_json::Value = response.json().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_value::<ErrorEnvelope>(raw)
                .ok()
                .and_then(|e| e.error)
                .and_then(|d| d.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Gemini request failed".to_string());
            warn!(status = %status, "Gemini request failed: {}", message);
            return Err(ParlorError::AssistantRequestFailed(message));
        }

        let parsed: GenerateResponse = serde_json::from_value(raw)?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(ParlorError::AssistantEmptyResponse);
        }
        Ok(text.to_string())
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt() {
        assert_eq!(build_prompt("what time is it?", None), "what time is it?");
        assert_eq!(
            build_prompt("what time is it?", Some("You are terse.")),
            "You are terse.\n\nUser: what time is it?"
        );
        assert_eq!(build_prompt("hi", Some("  ")), "hi");
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![TextPart {
                    text: "hello".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 512,
                temperature: 0.5,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 512);
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_call_time() {
        let client = GeminiClient::new(&AssistantConfig::default());
        assert!(!client.is_configured());
        let err = client
            .generate_reply("hi", &ReplyOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ParlorError::AssistantKeyMissing));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::with_api_key("k".into()).with_base_url("http://localhost:9/");
        assert_eq!(
            client.endpoint("k"),
            "http://localhost:9/v1beta/models/gemini-1.5-flash:generateContent?key=k"
        );
    }
}
