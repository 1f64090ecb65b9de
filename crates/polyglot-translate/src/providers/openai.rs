//! OpenAI-style chat-completion adapter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use polyglot_core::RateLimiter;
use serde_json::json;

use crate::error::TranslateError;
use crate::providers::{outcome, status_error, Translator};
use crate::registry::ProviderSettings;
use crate::types::{Provider, TranslationOutcome, TranslationPayload};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

const SYSTEM_PROMPT: &str =
    "You are a translation engine. Translate the user content preserving Markdown formatting and code.";

pub struct OpenAiTranslator {
    api_key: String,
    model: String,
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
}

impl OpenAiTranslator {
    pub fn new(settings: &ProviderSettings, limiter: Arc<RateLimiter>) -> Result<Self, TranslateError> {
        let api_key = settings
            .openai_api_key
            .clone()
            .ok_or_else(|| TranslateError::Configuration("OPENAI_API_KEY not configured".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            api_key,
            model: settings.openai_model.clone(),
            client,
            limiter,
        })
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    async fn translate(&self, payload: &TranslationPayload) -> Result<TranslationOutcome, TranslateError> {
        self.limiter.acquire(1.0).await;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": format!(
                    "{SYSTEM_PROMPT} Translate from {} to {}.",
                    if payload.source_lang.is_empty() { "the detected language" } else { &payload.source_lang },
                    payload.target_lang,
                ) },
                { "role": "user", "content": payload.text },
            ],
            "temperature": 0,
        });

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .timeout(payload.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(Provider::OpenAi, status, &text));
        }

        let data: serde_json::Value = response.json().await?;
        let translated = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| TranslateError::Provider("openai response missing message content".into()))?
            .trim()
            .to_string();

        Ok(outcome(Provider::OpenAi, translated))
    }
}
