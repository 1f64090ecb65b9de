//! Provider adapters.
//!
//! A closed set of backends behind one capability trait.  Fallback logic
//! lives in the registry only; adapters just translate or fail.

pub mod deepl;
pub mod google;
pub mod openai;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::TranslateError;
use crate::types::{Provider, TranslationOutcome, TranslationPayload};

/// Capability interface implemented by every translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    fn provider(&self) -> Provider;

    /// Translate `payload.text`.  The returned outcome's latency and char
    /// count are overwritten by the registry; adapters only fill in the text.
    async fn translate(&self, payload: &TranslationPayload) -> Result<TranslationOutcome, TranslateError>;
}

/// Map an HTTP error status to the right failure category: rate limiting and
/// server-side errors may clear up, anything else 4xx is permanent.
pub(crate) fn status_error(provider: Provider, status: StatusCode, body: &str) -> TranslateError {
    let detail = format!("{provider} returned {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        TranslateError::Transient(detail)
    } else {
        TranslateError::Provider(detail)
    }
}

pub(crate) fn outcome(provider: Provider, text: String) -> TranslationOutcome {
    TranslationOutcome {
        text,
        provider,
        latency: std::time::Duration::ZERO,
        char_count: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = status_error(Provider::Deepl, StatusCode::BAD_GATEWAY, "upstream");
        assert!(matches!(err, TranslateError::Transient(_)));

        let err = status_error(Provider::Deepl, StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(err, TranslateError::Transient(_)));
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = status_error(Provider::OpenAi, StatusCode::UNAUTHORIZED, "bad key");
        assert!(matches!(err, TranslateError::Provider(_)));
    }
}
