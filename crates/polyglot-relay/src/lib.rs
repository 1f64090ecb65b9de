//! # polyglot-relay
//!
//! The orchestrator tying the Polyglot pipeline together: the asynchronous
//! job queue and its single worker task, event handling for message
//! create/edit/delete, the cached per-channel delivery resources
//! (webhooks and translation threads), message formatting, language
//! detection, and process configuration.
//!
//! Inbound message events become [`TranslationJob`]s via [`events`]; the
//! worker drains the queue strictly in order, runs each job through span
//! masking, the translator registry and the glossary engine, dispatches the
//! result through the requested delivery kind, and records a durable
//! message mapping so edits and deletions can be propagated later.

pub mod chat;
pub mod config;
pub mod detect;
pub mod events;
pub mod format;
pub mod metrics;
pub mod rest;
pub mod threads;
pub mod webhooks;
pub mod worker;

mod error;

pub use chat::ChatClient;
pub use config::RelayConfig;
pub use events::{DeleteEvent, EventHandler, MessageEvent};
pub use error::{ChatError, RelayError};
pub use worker::{Relay, TranslationJob, Worker};

use std::sync::Arc;

use polyglot_store::Database;

/// Store handle shared between the worker and the event handlers.
///
/// SQLite access is synchronous and fast; the mutex is held only for the
/// duration of individual statements, never across awaits.
pub type SharedDb = Arc<tokio::sync::Mutex<Database>>;
