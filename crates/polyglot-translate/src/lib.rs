//! # polyglot-translate
//!
//! Provider adapters and the ordered-fallback translator registry.
//!
//! Each external translation backend (OpenAI-style chat completion, DeepL,
//! Google Cloud Translation) is wrapped in an adapter implementing the
//! [`Translator`] trait.  The [`TranslatorRegistry`] holds the configured
//! adapters in fallback order and guarantees callers never see a hard
//! failure: if every provider is down, the original text is returned
//! untranslated.  Outbound calls are throttled by a shared token bucket from
//! `polyglot-core`.

pub mod providers;
pub mod registry;

mod error;
mod types;

pub use error::TranslateError;
pub use providers::Translator;
pub use registry::{ProviderSettings, TranslatorRegistry};
pub use types::{Provider, TranslationOutcome, TranslationPayload};
