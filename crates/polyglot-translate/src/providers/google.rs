//! Google Cloud Translation v3 adapter.
//!
//! Credentials are read once at construction; a missing or malformed
//! credentials file disables the provider rather than failing requests later.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use polyglot_core::RateLimiter;
use serde_json::json;

use crate::error::TranslateError;
use crate::providers::{outcome, status_error, Translator};
use crate::registry::ProviderSettings;
use crate::types::{Provider, TranslationOutcome, TranslationPayload};

#[derive(Debug)]
pub struct GoogleTranslator {
    project_id: String,
    access_token: String,
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
}

impl GoogleTranslator {
    pub fn new(settings: &ProviderSettings, limiter: Arc<RateLimiter>) -> Result<Self, TranslateError> {
        let project_id = settings
            .google_project_id
            .clone()
            .ok_or_else(|| TranslateError::Configuration("GOOGLE_PROJECT_ID not configured".into()))?;
        let credentials_path: PathBuf = settings
            .google_credentials
            .clone()
            .ok_or_else(|| TranslateError::Configuration("GOOGLE_APPLICATION_CREDENTIALS not configured".into()))?;

        let raw = std::fs::read_to_string(&credentials_path).map_err(|e| {
            TranslateError::Configuration(format!(
                "Google credentials file {} unreadable: {e}",
                credentials_path.display()
            ))
        })?;
        let creds: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| TranslateError::Configuration(format!("Google credentials not valid JSON: {e}")))?;
        let access_token = creds["token"]
            .as_str()
            .ok_or_else(|| TranslateError::Configuration("Google credentials missing token field".into()))?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            project_id,
            access_token,
            client,
            limiter,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn translate(&self, payload: &TranslationPayload) -> Result<TranslationOutcome, TranslateError> {
        self.limiter.acquire(1.0).await;

        let url = format!(
            "https://translation.googleapis.com/v3/projects/{}:translateText",
            self.project_id
        );

        let mut body = json!({
            "contents": [payload.text],
            "mimeType": "text/plain",
            "targetLanguageCode": payload.target_lang,
        });
        if !payload.source_lang.is_empty() {
            body["sourceLanguageCode"] = json!(payload.source_lang);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .timeout(payload.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(Provider::Google, status, &text));
        }

        let data: serde_json::Value = response.json().await?;
        let translated = data["translations"][0]["translatedText"]
            .as_str()
            .ok_or_else(|| TranslateError::Provider("google response missing translatedText".into()))?
            .to_string();

        Ok(outcome(Provider::Google, translated))
    }
}
