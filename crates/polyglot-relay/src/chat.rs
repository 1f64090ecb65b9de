//! Abstract chat-platform I/O surface.
//!
//! The pipeline never talks to the platform directly; everything goes
//! through [`ChatClient`] so tests can substitute an in-memory fake and the
//! REST implementation stays swappable.

use async_trait::async_trait;
use polyglot_core::{ChannelId, GuildId, MessageId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// What shape of channel an id resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Text,
    Thread,
    Dm,
}

/// A resolved channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub kind: ChannelKind,
}

/// A message the platform accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
}

/// A webhook delivery resource owned by this application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookInfo {
    pub id: u64,
    pub token: String,
    pub name: String,
    /// The user the platform says created this webhook, when reported.
    pub owner_id: Option<UserId>,
}

/// A thread hanging off a text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: ChannelId,
    pub name: String,
    pub parent_id: ChannelId,
}

/// Parameters for an inline webhook post impersonating the original author.
#[derive(Debug, Clone)]
pub struct WebhookPost {
    pub content: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Chat-platform primitives consumed by the relay.
///
/// Implementations must disable platform-side mention auto-expansion on
/// every send; the relay additionally defuses literal `@` characters in
/// webhook content (see [`crate::format::defuse_mentions`]).
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, ChatError>;

    /// Plain message send into a channel or thread.
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<SentMessage, ChatError>;

    async fn create_thread(&self, channel: ChannelId, name: &str) -> Result<ThreadInfo, ChatError>;

    /// Threads currently hanging off `channel`.
    async fn list_threads(&self, channel: ChannelId) -> Result<Vec<ThreadInfo>, ChatError>;

    async fn create_webhook(&self, channel: ChannelId, name: &str) -> Result<WebhookInfo, ChatError>;

    async fn list_webhooks(&self, channel: ChannelId) -> Result<Vec<WebhookInfo>, ChatError>;

    async fn send_via_webhook(
        &self,
        webhook: &WebhookInfo,
        post: WebhookPost,
    ) -> Result<SentMessage, ChatError>;

    /// Resolve (or open) the DM channel for a user.
    async fn create_dm_channel(&self, user: UserId) -> Result<ChannelId, ChatError>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError>;
}
