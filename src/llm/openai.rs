use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{read_json, ChatBackend, GenerationParams};
use crate::model::{ContextMessage, Role};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const LOCAL_BASE_URL: &str = "http://localhost:11434/v1";

/// Any server speaking the OpenAI chat completions API.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    params: GenerationParams,
    name: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl OpenAiBackend {
    pub fn new(
        client: Client,
        base_url: Option<String>,
        api_key: String,
        params: GenerationParams,
    ) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            api_key: Some(api_key),
            params,
            name: "openai",
        }
    }

    /// Local model server (Ollama, LM Studio); no credential.
    pub fn local(client: Client, base_url: Option<String>, params: GenerationParams) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| LOCAL_BASE_URL.to_string()),
            api_key: None,
            params,
            name: "local",
        }
    }

    fn messages<'a>(
        system_prompt: &'a str,
        history: &'a [ContextMessage],
        message: &'a str,
    ) -> Vec<ChatMessage<'a>> {
        let mut result = Vec::with_capacity(history.len() + 2);
        result.push(ChatMessage {
            role: "system",
            content: system_prompt,
        });
        for msg in history {
            result.push(ChatMessage {
                role: match msg.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &msg.content,
            });
        }
        result.push(ChatMessage {
            role: "user",
            content: message,
        });
        result
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ContextMessage],
        message: &str,
    ) -> Result<String> {
        let body = ChatRequest {
            model: &self.params.model,
            messages: Self::messages(system_prompt, history, message),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .json(&body);
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;
        let json = read_json(self.name, response).await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .context("No message content in chat completion")
    }
}
