//! # polyglot-store
//!
//! Durable storage for the Polyglot relay, backed by SQLite.
//!
//! Holds the original→translated message mappings (read back when a source
//! message is edited or deleted), per-guild glossaries, guild/user/channel
//! preferences, and daily usage counters.  The crate exposes a synchronous
//! [`Database`] handle wrapping a `rusqlite::Connection` with typed CRUD
//! helpers for every domain model.

pub mod database;
pub mod glossary;
pub mod mappings;
pub mod migrations;
pub mod models;
pub mod settings;
pub mod usage;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
