//! LLM fallback for questions the local corpus cannot answer.
//!
//! [`LlmFallback`] wraps one [`ChatBackend`] (OpenAI-compatible, Anthropic or
//! Gemini) behind the [`ResponseCache`]. Calls are made once, bounded by a
//! timeout; every failure surfaces as an `Err` for the caller to turn into the
//! local "not sure" reply.

mod anthropic;
mod gemini;
mod openai;
pub mod prompts;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::cache::{CacheStore, FileStore, MemoryStore, ResponseCache};
use crate::model::{ContextMessage, FallbackAnswer};
use crate::settings::Settings;
use crate::suggestions::dynamic_suggestions;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

/// How many trailing context turns are forwarded to the provider.
pub const MAX_CONTEXT_MESSAGES: usize = 5;

pub const SUPPORTED_CITIES: [&str; 5] = [
    "Phnom Penh",
    "Siem Reap",
    "Battambang",
    "Sihanoukville",
    "Kampot",
];

/// Generation knobs shared by every provider.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;

    /// One generation call. `history` is already trimmed to the recent turns.
    async fn generate(
        &self,
        system_prompt: &str,
        history: &[ContextMessage],
        message: &str,
    ) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Local,
    Anthropic,
    Gemini,
}

impl Provider {
    /// `None` for "none", an empty value, or an unknown name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "local" | "ollama" => Some(Provider::Local),
            "anthropic" => Some(Provider::Anthropic),
            "gemini" | "google" => Some(Provider::Gemini),
            "" | "none" => None,
            other => {
                log::warn!("Unknown LLM provider '{}', fallback disabled", other);
                None
            }
        }
    }

    fn needs_api_key(&self) -> bool {
        !matches!(self, Provider::Local)
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4",
            Provider::Local => "llama3",
            Provider::Anthropic => "claude-3-5-haiku-latest",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }
}

/// First supported city named in the message.
pub fn detect_location(message: &str) -> Option<&'static str> {
    let lower_text = message.to_lowercase();
    SUPPORTED_CITIES
        .iter()
        .find(|city| lower_text.contains(&city.to_lowercase()))
        .copied()
}

pub fn recent_context(context: &[ContextMessage]) -> &[ContextMessage] {
    &context[context.len().saturating_sub(MAX_CONTEXT_MESSAGES)..]
}

/// Splits a follow-up completion into at most three bare questions.
pub fn parse_follow_ups(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| {
                    c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*' | '•')
                })
                .trim()
        })
        .filter(|line| !line.is_empty())
        .take(3)
        .map(str::to_string)
        .collect()
}

pub struct LlmFallback {
    backend: Box<dyn ChatBackend>,
    cache: ResponseCache,
    timeout: Duration,
}

impl LlmFallback {
    pub fn new(backend: Box<dyn ChatBackend>, cache: ResponseCache, timeout: Duration) -> Self {
        Self {
            backend,
            cache,
            timeout,
        }
    }

    /// Builds the configured fallback, or `None` when it is switched off or
    /// cannot work (no credential).
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let Some(provider) = Provider::parse(&settings.llm_provider) else {
            log::info!("LLM fallback disabled");
            return Ok(None);
        };
        if provider.needs_api_key() && settings.llm_api_key.trim().is_empty() {
            log::warn!(
                "LLM provider '{}' configured without LLM_API_KEY, fallback disabled",
                settings.llm_provider
            );
            return Ok(None);
        }

        let params = GenerationParams {
            model: settings
                .llm_model
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| provider.default_model().to_string()),
            temperature: settings.llm_temperature,
            max_tokens: settings.llm_max_tokens,
        };
        let http = reqwest::Client::builder()
            .timeout(settings.llm_timeout())
            .build()
            .map_err(|e| anyhow!("Failed to create LLM HTTP client: {e}"))?;
        let api_key = settings.llm_api_key.clone();
        let base_url = settings.llm_base_url.clone().filter(|u| !u.trim().is_empty());

        let backend: Box<dyn ChatBackend> = match provider {
            Provider::OpenAi => Box::new(OpenAiBackend::new(http, base_url, api_key, params)),
            Provider::Local => Box::new(OpenAiBackend::local(http, base_url, params)),
            Provider::Anthropic => {
                Box::new(AnthropicBackend::new(http, base_url, api_key, params))
            }
            Provider::Gemini => Box::new(GeminiBackend::new(http, base_url, api_key, params)),
        };

        let store: Box<dyn CacheStore> = match FileStore::new(&settings.cache_dir) {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("{:#}; caching LLM responses in memory instead", e);
                Box::new(MemoryStore::default())
            }
        };
        let cache = ResponseCache::new(store, settings.cache_ttl(), settings.enable_cache);

        log::info!(
            "LLM fallback enabled: provider={}, cache={} (ttl {}s, dir '{}')",
            backend.name(),
            settings.enable_cache,
            settings.cache_expiry,
            settings.cache_dir
        );
        Ok(Some(Self::new(backend, cache, settings.llm_timeout())))
    }

    pub fn provider_name(&self) -> &str {
        self.backend.name()
    }

    /// Cached answer if one is fresh, otherwise a new generation plus
    /// follow-up suggestions, which is then cached.
    pub async fn answer(
        &self,
        message: &str,
        context: &[ContextMessage],
    ) -> Result<FallbackAnswer> {
        let location = detect_location(message);
        if let Some(hit) = self.cache.get(message, context, location).await {
            return Ok(hit);
        }

        let system_prompt = prompts::system_prompt(location);
        let answer = self
            .call(&system_prompt, recent_context(context), message)
            .await?;
        let suggestions = self.follow_ups(&system_prompt, &answer, message).await;

        let response = FallbackAnswer {
            message: answer,
            suggestions,
        };
        self.cache.put(message, &response, context, location).await;
        Ok(response)
    }

    async fn call(
        &self,
        system_prompt: &str,
        history: &[ContextMessage],
        message: &str,
    ) -> Result<String> {
        let text = tokio::time::timeout(
            self.timeout,
            self.backend.generate(system_prompt, history, message),
        )
        .await
        .map_err(|_| anyhow!("{} call timed out after {:?}", self.backend.name(), self.timeout))??;

        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow!("{} returned an empty answer", self.backend.name()));
        }
        Ok(text.to_string())
    }

    async fn follow_ups(&self, system_prompt: &str, answer: &str, message: &str) -> Vec<String> {
        match self
            .call(system_prompt, &[], &prompts::follow_up_prompt(answer))
            .await
        {
            Ok(text) => {
                let questions = parse_follow_ups(&text);
                if questions.is_empty() {
                    dynamic_suggestions(message)
                } else {
                    questions
                }
            }
            Err(e) => {
                log::warn!("Follow-up generation failed: {:#}", e);
                dynamic_suggestions(message)
            }
        }
    }
}

/// Shared status check for the HTTP backends.
pub(crate) async fn read_json(
    provider: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("{} API returned {}: {}", provider, status, body);
    }
    Ok(response.json().await?)
}
