use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifies which backend produced (or passed through) a translation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Deepl,
    Google,
    /// Sentinel for the no-providers-configured passthrough.
    Echo,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Deepl => "deepl",
            Provider::Google => "google",
            Provider::Echo => "echo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "deepl" => Some(Provider::Deepl),
            "google" => Some(Provider::Google),
            "echo" => Some(Provider::Echo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One translation request as handed to an adapter.
#[derive(Debug, Clone)]
pub struct TranslationPayload {
    /// Masked message text (placeholders already substituted for spans).
    pub text: String,
    /// Detected source language code; empty when detection was inconclusive.
    pub source_lang: String,
    pub target_lang: String,
    /// Term hints for providers that support glossaries natively.
    pub glossary_hints: Vec<(String, String)>,
    /// Per-request deadline, applied on top of the adapter's client timeout.
    pub timeout: Duration,
}

impl TranslationPayload {
    pub fn new(text: impl Into<String>, source_lang: impl Into<String>, target_lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            glossary_hints: Vec::new(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Result of one registry call.  Produced fresh per call, never shared.
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub text: String,
    pub provider: Provider,
    /// Wall-clock latency of the winning provider call (zero on passthrough).
    pub latency: Duration,
    /// Character count of the input, for usage accounting.
    pub char_count: usize,
}
