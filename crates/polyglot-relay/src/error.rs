use polyglot_core::{SpanError, UserId};
use polyglot_store::StoreError;
use thiserror::Error;

/// Errors from the chat-platform client surface.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform rejected the request.
    #[error("Platform returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// Channel, message or webhook no longer exists.
    #[error("Resource not found")]
    NotFound,

    /// The platform response was missing an expected field.
    #[error("Malformed platform response: {0}")]
    Malformed(String),
}

impl ChatError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChatError::NotFound) || matches!(self, ChatError::Status { status: 404, .. })
    }
}

/// How a failed job should be classified by whoever looks at the logs.
///
/// The worker itself never retries; the category tells a future re-enqueue
/// layer (or an operator) whether retrying could possibly help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Retrying the same job might succeed (network flake, 5xx).
    Retryable,
    /// The job can never succeed as-is (mangled placeholder, bad data).
    Permanent,
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCategory::Retryable => f.write_str("retryable"),
            FailureCategory::Permanent => f.write_str("permanent"),
        }
    }
}

/// Job-processing errors.  Any of these aborts the current job only; the
/// worker loop logs and moves on.
#[derive(Error, Debug)]
pub enum RelayError {
    /// A provider dropped or mangled a placeholder.
    #[error(transparent)]
    Span(#[from] SpanError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Chat platform error: {0}")]
    Chat(#[from] ChatError),

    /// The recipient's DM channel could not be opened at dispatch time.
    #[error("Unable to open DM channel for user {0}")]
    DmUnresolvable(UserId),
}

impl RelayError {
    pub fn category(&self) -> FailureCategory {
        match self {
            RelayError::Span(_) => FailureCategory::Permanent,
            RelayError::Store(_) => FailureCategory::Permanent,
            RelayError::Chat(ChatError::Http(_)) => FailureCategory::Retryable,
            RelayError::Chat(ChatError::Status { status, .. }) if *status >= 500 || *status == 429 => {
                FailureCategory::Retryable
            }
            RelayError::Chat(_) => FailureCategory::Permanent,
            // The recipient left or closed their DMs; re-running the same
            // job cannot open the channel.
            RelayError::DmUnresolvable(_) => FailureCategory::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_failures_are_permanent() {
        let err = RelayError::Span(SpanError::MissingPlaceholder("⟦SP0⟧".into()));
        assert_eq!(err.category(), FailureCategory::Permanent);
    }

    #[test]
    fn server_side_chat_failures_are_retryable() {
        let err = RelayError::Chat(ChatError::Status { status: 502, detail: "bad gateway".into() });
        assert_eq!(err.category(), FailureCategory::Retryable);

        let err = RelayError::Chat(ChatError::Status { status: 403, detail: "forbidden".into() });
        assert_eq!(err.category(), FailureCategory::Permanent);
    }

    #[test]
    fn unresolvable_dm_names_the_recipient() {
        let err = RelayError::DmUnresolvable(UserId(42));
        assert_eq!(err.category(), FailureCategory::Permanent);
        assert!(err.to_string().contains("user 42"));
    }
}
