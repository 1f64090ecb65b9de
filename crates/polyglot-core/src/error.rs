use thiserror::Error;

/// Errors raised by span extraction / restoration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpanError {
    /// A placeholder was dropped, translated, or mangled by the provider.
    /// Restoration must fail hard; proceeding would corrupt the output.
    #[error("Missing placeholder {0} in translated text")]
    MissingPlaceholder(String),
}
