use thiserror::Error;

/// Errors raised by provider adapters.
///
/// The registry absorbs `Provider` and `Transient` (advance to the next
/// provider in fallback order); `Configuration` is surfaced once at adapter
/// construction and excludes that provider from the registry entirely.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// The adapter cannot be used at all (missing key, unreadable
    /// credentials).  Logged once at startup; the provider is skipped.
    #[error("Provider misconfigured: {0}")]
    Configuration(String),

    /// A permanent failure from the backend (auth rejected, 4xx response).
    #[error("Provider failure: {0}")]
    Provider(String),

    /// A retryable-in-principle failure (timeout, 5xx, connection reset).
    #[error("Transient translation failure: {0}")]
    Transient(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        // Network-level failures are transient by nature; the next provider
        // (or a later attempt) may well succeed.
        TranslateError::Transient(e.to_string())
    }
}
