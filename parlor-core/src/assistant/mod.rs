//! Single-shot generative replies for `@ai` mentions.

mod gemini;

use async_trait::async_trait;

use crate::config::AssistantConfig;
use crate::error::ParlorResult;

pub use gemini::{build_prompt, GeminiClient, GEMINI_API_BASE};

/// Per-call generation options.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyOptions {
    pub system_prompt: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for ReplyOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_output_tokens: 512,
            temperature: 0.7,
        }
    }
}

impl From<&AssistantConfig> for ReplyOptions {
    fn from(config: &AssistantConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
pub trait AssistantClient: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Returns the first candidate's text, trimmed. No memory between calls.
    async fn generate_reply(&self, prompt: &str, options: &ReplyOptions) -> ParlorResult<String>;

    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let mut config = AssistantConfig::default();
        config.system_prompt = Some("Be brief.".to_string());
        config.max_output_tokens = 128;
        let options = ReplyOptions::from(&config);
        assert_eq!(options.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(options.max_output_tokens, 128);
        assert_eq!(ReplyOptions::default().max_output_tokens, 512);
    }
}
