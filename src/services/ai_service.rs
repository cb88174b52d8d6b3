use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::ai::*;
use crate::utils::http::build_ai_client;

/// External text generation: one prompt in, one complete reply out.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client, used non-streaming.
pub struct AIService {
    config: AIConfig,
    client: reqwest::Client,
}

impl AIService {
    pub fn new(config: AIConfig) -> Result<Self> {
        let client = build_ai_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    fn request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model_name.clone(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            stream: Some(false),
        }
    }
}

#[async_trait]
impl GenerationService for AIService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(anyhow!("no API key configured (set SCREENER_API_KEY or GEMINI_API_KEY)"));
        }

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(anyhow!("AI API error ({}): {}", status, truncate(&body, 300)));
        }

        let response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| anyhow!("AI response parse error: {} body: {}", e, truncate(&body, 200)))?;

        if let Some(usage) = &response.usage {
            log::debug!(
                "{} usage: prompt={} completion={} total={}",
                self.config.model_name,
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        extract_content(&response)
    }
}

fn extract_content(response: &ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.clone())
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| anyhow!("AI returned an empty response"))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
