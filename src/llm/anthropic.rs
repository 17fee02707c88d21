use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{read_json, ChatBackend, GenerationParams};
use crate::model::{ContextMessage, Role};

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    client: Client,
    base_url: String,
    api_key: String,
    params: GenerationParams,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, PartialEq)]
struct Message {
    role: &'static str,
    content: String,
}

impl AnthropicBackend {
    pub fn new(
        client: Client,
        base_url: Option<String>,
        api_key: String,
        params: GenerationParams,
    ) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
            api_key,
            params,
        }
    }

    /// The messages API wants the conversation to open with a user turn and
    /// roles to alternate, so leading assistant turns are dropped and runs of
    /// same-role turns are joined.
    fn messages(history: &[ContextMessage], message: &str) -> Vec<Message> {
        let turns = history
            .iter()
            .skip_while(|m| m.role != Role::User)
            .map(|m| (m.role, m.content.as_str()))
            .chain(std::iter::once((Role::User, message)));

        let mut messages: Vec<Message> = Vec::new();
        for (role, content) in turns {
            let role = match role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            match messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push_str("\n\n");
                    last.content.push_str(content);
                }
                _ => messages.push(Message {
                    role,
                    content: content.to_string(),
                }),
            }
        }
        messages
    }
}

#[async_trait]
impl ChatBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ContextMessage],
        message: &str,
    ) -> Result<String> {
        let body = MessagesRequest {
            model: &self.params.model,
            system: system_prompt,
            messages: Self::messages(history, message),
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
        };

        let response = self
            .client
            .post(format!("{}/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("anthropic request failed")?;
        let json = read_json("anthropic", response).await?;

        let text: Vec<&str> = json["content"]
            .as_array()
            .context("No content in anthropic response")?
            .iter()
            .filter(|block| block["type"] == "text")
            .filter_map(|block| block["text"].as_str())
            .collect();
        Ok(text.join(""))
    }
}
