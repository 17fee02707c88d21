use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::prompts::GEMINI_ACKNOWLEDGEMENT;
use super::{read_json, ChatBackend, GenerationParams};
use crate::model::{ContextMessage, Role};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    params: GenerationParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, PartialEq)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

fn content<'a>(role: &'static str, text: &'a str) -> Content<'a> {
    Content {
        role,
        parts: vec![Part { text }],
    }
}

impl GeminiBackend {
    pub fn new(
        client: Client,
        base_url: Option<String>,
        api_key: String,
        params: GenerationParams,
    ) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            api_key,
            params,
        }
    }

    /// Gemini has no system slot here: with no history the system prompt is
    /// sent as an opening user turn the model acknowledges.
    fn contents<'a>(
        system_prompt: &'a str,
        history: &'a [ContextMessage],
        message: &'a str,
    ) -> Vec<Content<'a>> {
        let mut conversation: Vec<Content<'a>> = history
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                content(role, &m.content)
            })
            .collect();

        if conversation.is_empty() {
            conversation.push(content("user", system_prompt));
            conversation.push(content("model", GEMINI_ACKNOWLEDGEMENT));
        }
        conversation.push(content("user", message));
        conversation
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ContextMessage],
        message: &str,
    ) -> Result<String> {
        let body = GenerateRequest {
            contents: Self::contents(system_prompt, history, message),
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
            },
        };
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.params.model
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;
        let json = read_json("gemini", response).await?;

        let parts = json["candidates"][0]["content"]["parts"]
            .as_array()
            .context("No candidates in gemini response")?;
        Ok(parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join(""))
    }
}
