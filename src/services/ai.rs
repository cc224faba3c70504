// src/services/ai.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::Config;

/// Result of asking the language model for something.
///
/// Callers pick their own fallback for `Unavailable`; model failures never
/// travel further than this value.
#[derive(Debug, Clone, PartialEq)]
pub enum AiOutcome<T> {
    Generated(T),
    Unavailable { reason: String },
}

impl<T> AiOutcome<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        AiOutcome::Unavailable {
            reason: reason.into(),
        }
    }

    /// Converts a collaborator result, logging the failure.
    pub fn from_result(result: Result<T>, task: &str) -> Self {
        match result {
            Ok(value) => AiOutcome::Generated(value),
            Err(e) => {
                tracing::warn!(task = task, "AI collaborator unavailable: {:#}", e);
                AiOutcome::unavailable(format!("{e:#}"))
            }
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, AiOutcome::Generated(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AiOutcome<U> {
        match self {
            AiOutcome::Generated(value) => AiOutcome::Generated(f(value)),
            AiOutcome::Unavailable { reason } => AiOutcome::Unavailable { reason },
        }
    }

    pub fn unwrap_or_else(self, fallback: impl FnOnce() -> T) -> T {
        match self {
            AiOutcome::Generated(value) => value,
            AiOutcome::Unavailable { .. } => fallback(),
        }
    }
}

/// A chat-style text model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OpenAiModel {
    pub fn from_config(config: &Config, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.ai_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.ai_model.clone(),
            temperature: 0.3,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let timer = Instant::now();
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.temperature
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Failed to call OpenAI API")?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("Failed to read OpenAI response")?;
        if !status.is_success() {
            return Err(anyhow!("OpenAI API error ({status}): {body}"));
        }

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|value| value.as_str())
            .context("Missing OpenAI response content")?;

        tracing::debug!(
            model = %self.model,
            duration_seconds = timer.elapsed().as_secs_f64(),
            "AI completion finished"
        );

        Ok(content.to_string())
    }
}

/// Stand-in when no API key is configured. Every call fails, so every caller
/// takes its fallback path.
#[derive(Debug, Clone, Default)]
pub struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Err(anyhow!("no language model configured"))
    }
}

pub fn from_config(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    match &config.openai_api_key {
        Some(key) => Ok(Arc::new(OpenAiModel::from_config(config, key.clone())?)),
        None => {
            tracing::warn!("OPENAI_API_KEY not set, AI features will use fallbacks");
            Ok(Arc::new(UnavailableModel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_helpers() {
        let ok: AiOutcome<u32> = AiOutcome::from_result(Ok(2), "test");
        assert!(ok.is_generated());
        assert_eq!(ok.clone().map(|v| v * 2), AiOutcome::Generated(4));

        let failed: AiOutcome<u32> = AiOutcome::from_result(Err(anyhow!("down")), "test");
        assert!(!failed.is_generated());
        assert_eq!(failed.unwrap_or_else(|| 7), 7);
    }

    #[tokio::test]
    async fn unavailable_model_always_fails() {
        assert!(UnavailableModel.complete("s", "p").await.is_err());
    }
}
