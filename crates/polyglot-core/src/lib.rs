//! # polyglot-core
//!
//! Pure pipeline primitives for the Polyglot translation relay: span-preserving
//! tokenization of chat markup, the glossary substitution engine, the
//! token-bucket rate limiter, and the id newtypes shared by every other crate.
//!
//! Nothing in this crate performs I/O; everything is deterministic and
//! testable in isolation.

pub mod glossary;
pub mod ratelimit;
pub mod spans;
pub mod types;

mod error;

pub use error::SpanError;
pub use glossary::{apply_glossary, compile_glossary, CompiledRule, GlossaryTerm};
pub use ratelimit::RateLimiter;
pub use spans::{restore, Span, SpanExtractor, SpanKind};
pub use types::{ChannelId, DeliveryKind, GuildId, MessageId, UserId};
