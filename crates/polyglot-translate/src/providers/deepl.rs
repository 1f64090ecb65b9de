//! DeepL v2 adapter (form-encoded API).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use polyglot_core::RateLimiter;

use crate::error::TranslateError;
use crate::providers::{outcome, status_error, Translator};
use crate::registry::ProviderSettings;
use crate::types::{Provider, TranslationOutcome, TranslationPayload};

const API_URL: &str = "https://api-free.deepl.com/v2/translate";

pub struct DeeplTranslator {
    api_key: String,
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
}

impl DeeplTranslator {
    pub fn new(settings: &ProviderSettings, limiter: Arc<RateLimiter>) -> Result<Self, TranslateError> {
        let api_key = settings
            .deepl_api_key
            .clone()
            .ok_or_else(|| TranslateError::Configuration("DEEPL_API_KEY not configured".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self { api_key, client, limiter })
    }
}

#[async_trait]
impl Translator for DeeplTranslator {
    fn provider(&self) -> Provider {
        Provider::Deepl
    }

    async fn translate(&self, payload: &TranslationPayload) -> Result<TranslationOutcome, TranslateError> {
        self.limiter.acquire(1.0).await;

        let mut params: Vec<(&str, String)> = vec![
            ("text", payload.text.clone()),
            ("target_lang", payload.target_lang.to_uppercase()),
        ];
        if !payload.source_lang.is_empty() {
            params.push(("source_lang", payload.source_lang.to_uppercase()));
        }

        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("DeepL-Auth-Key {}", self.api_key))
            .timeout(payload.timeout)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(Provider::Deepl, status, &text));
        }

        let data: serde_json::Value = response.json().await?;
        let translated = data["translations"][0]["text"]
            .as_str()
            .ok_or_else(|| TranslateError::Provider("deepl response missing translation".into()))?
            .to_string();

        Ok(outcome(Provider::Deepl, translated))
    }
}
