//! Domain model structs persisted in the relay database.

use chrono::{DateTime, NaiveDate, Utc};
use polyglot_core::{ChannelId, DeliveryKind, GuildId, MessageId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message mapping
// ---------------------------------------------------------------------------

/// Durable link between a source message and one of its translated copies.
///
/// One row per (original message, destination language, delivery kind) ever
/// dispatched.  Read back to cascade deletions; edits create new rows rather
/// than mutating old ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageMapping {
    /// Surrogate primary key.
    pub id: i64,
    pub guild_id: GuildId,
    /// Channel the translated copy was posted in.
    pub channel_id: ChannelId,
    pub original_msg_id: MessageId,
    pub translated_msg_id: MessageId,
    /// Destination language code.
    pub dst_lang: String,
    pub kind: DeliveryKind,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Glossary
// ---------------------------------------------------------------------------

/// A pinned term translation for one guild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlossaryEntry {
    pub guild_id: GuildId,
    pub term: String,
    pub translation: String,
    /// Optional moderator note about when the term applies.
    pub context: Option<String>,
    /// Lower priority is applied first.
    pub priority: i64,
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Per-guild relay defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildSettings {
    pub guild_id: GuildId,
    pub default_lang: Option<String>,
    /// `on_demand`, `inline_auto` or `dm_mirror`.
    pub default_mode: String,
    /// Cap on target languages when inline auto-translation is active.
    pub inline_auto_max_langs: i64,
    /// How long translated copies are kept before cleanup.
    pub retention_hours: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSettings {
    pub user_id: UserId,
    pub preferred_lang: Option<String>,
    pub dm_mirror_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-channel override of the guild defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelOverride {
    pub channel_id: ChannelId,
    pub guild_id: GuildId,
    pub enabled: bool,
    pub mode: Option<String>,
    /// Comma-separated target language codes.
    pub target_langs: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ChannelOverride {
    /// Target languages as a list, empty when unset.
    pub fn target_lang_list(&self) -> Vec<String> {
        self.target_langs
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Usage accounting
// ---------------------------------------------------------------------------

/// Daily translation volume for one guild.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageStats {
    pub guild_id: GuildId,
    pub day: NaiveDate,
    pub char_count: i64,
    pub cost_estimate_usd: f64,
}
