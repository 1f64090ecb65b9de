//! Ordered-fallback translator registry.
//!
//! Adapters are constructed once from [`ProviderSettings`]; one that fails
//! configuration is logged and excluded, never retried.  At call time the
//! registry walks the surviving adapters in configured order and returns the
//! first success.  A single global mutex serializes all translation traffic,
//! so at most one provider request is in flight system-wide at any instant.
//! That is a deliberate throughput ceiling: it keeps provider state from
//! interleaving and makes per-channel output ordering trivial to reason
//! about.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use polyglot_core::RateLimiter;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::error::TranslateError;
use crate::providers::deepl::DeeplTranslator;
use crate::providers::google::GoogleTranslator;
use crate::providers::openai::OpenAiTranslator;
use crate::providers::Translator;
use crate::types::{Provider, TranslationOutcome, TranslationPayload};

/// Configuration for provider construction and throttling.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Fallback order.  Duplicates and unknown names are filtered upstream.
    pub order: Vec<Provider>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub deepl_api_key: Option<String>,
    pub google_project_id: Option<String>,
    pub google_credentials: Option<PathBuf>,
    /// Shared token-bucket refill rate (calls per second).
    pub rate: f64,
    /// Shared token-bucket burst capacity.
    pub burst: f64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            order: vec![Provider::OpenAi],
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            deepl_api_key: None,
            google_project_id: None,
            google_credentials: None,
            rate: 5.0,
            burst: 10.0,
        }
    }
}

/// Wraps the configured provider adapters behind one fallback interface.
pub struct TranslatorRegistry {
    translators: Vec<Box<dyn Translator>>,
    lock: Mutex<()>,
}

impl TranslatorRegistry {
    /// Build adapters in the configured order, skipping any whose
    /// configuration is invalid.
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let limiter = Arc::new(RateLimiter::new(settings.rate, settings.burst));

        let mut translators: Vec<Box<dyn Translator>> = Vec::new();
        for provider in &settings.order {
            let built: Result<Box<dyn Translator>, TranslateError> = match provider {
                Provider::OpenAi => {
                    OpenAiTranslator::new(settings, limiter.clone()).map(|t| Box::new(t) as _)
                }
                Provider::Deepl => {
                    DeeplTranslator::new(settings, limiter.clone()).map(|t| Box::new(t) as _)
                }
                Provider::Google => {
                    GoogleTranslator::new(settings, limiter.clone()).map(|t| Box::new(t) as _)
                }
                Provider::Echo => continue,
            };
            match built {
                Ok(translator) => translators.push(translator),
                Err(e) => warn!(provider = %provider, error = %e, "skipping provider"),
            }
        }

        if translators.is_empty() {
            warn!("no translators configured; falling back to echo passthrough");
        }

        Self::with_translators(translators)
    }

    /// Assemble a registry from pre-built adapters.  Used by tests and by
    /// embedders with custom backends.
    pub fn with_translators(translators: Vec<Box<dyn Translator>>) -> Self {
        Self {
            translators,
            lock: Mutex::new(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }

    /// Fallback order currently in effect.
    pub fn providers(&self) -> Vec<Provider> {
        self.translators.iter().map(|t| t.provider()).collect()
    }

    /// Translate, trying providers in order and short-circuiting on the
    /// first success.
    ///
    /// Never returns an error: with no providers configured (or all of them
    /// failing) the caller receives the input text verbatim, tagged with
    /// [`Provider::Echo`] or the last-attempted provider respectively.
    pub async fn translate(&self, payload: &TranslationPayload) -> TranslationOutcome {
        let char_count = payload.text.chars().count();

        if self.translators.is_empty() {
            return TranslationOutcome {
                text: payload.text.clone(),
                provider: Provider::Echo,
                latency: std::time::Duration::ZERO,
                char_count,
            };
        }

        let _serial = self.lock.lock().await;

        for translator in &self.translators {
            let provider = translator.provider();
            let start = Instant::now();
            match translator.translate(payload).await {
                Ok(mut outcome) => {
                    outcome.latency = start.elapsed();
                    outcome.char_count = char_count;
                    return outcome;
                }
                Err(TranslateError::Transient(detail)) => {
                    warn!(provider = %provider, detail = %detail, "transient provider failure");
                }
                Err(e) => {
                    warn!(provider = %provider, error = %e, "provider failed");
                }
            }
        }

        error!("all translators failed; returning original text");
        TranslationOutcome {
            text: payload.text.clone(),
            provider: self.translators[self.translators.len() - 1].provider(),
            latency: std::time::Duration::ZERO,
            char_count,
        }
    }
}
