//! Cached per-channel webhook resources with creation deduplication.
//!
//! Each channel gets one cache cell guarded by its own mutex: two concurrent
//! dispatches into the same channel serialize on that cell (double-checked
//! locking), so at most one creation call ever reaches the platform, while
//! dispatches into different channels proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use polyglot_core::{ChannelId, UserId};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::chat::{ChatClient, WebhookInfo};
use crate::error::ChatError;

/// Well-known name of the relay's inline-delivery webhook.
pub const WEBHOOK_NAME: &str = "Polyglot Inline";

type Cell = Arc<Mutex<Option<WebhookInfo>>>;

pub struct WebhookManager {
    client: Arc<dyn ChatClient>,
    /// The bot's own user id, used to claim only webhooks we created.
    own_user: Option<UserId>,
    cells: Mutex<HashMap<ChannelId, Cell>>,
}

impl WebhookManager {
    pub fn new(client: Arc<dyn ChatClient>, own_user: Option<UserId>) -> Self {
        Self {
            client,
            own_user,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the channel's webhook, discovering or creating it on first use.
    pub async fn ensure(&self, channel: ChannelId) -> Result<WebhookInfo, ChatError> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(channel).or_default().clone()
        };

        let mut slot = cell.lock().await;
        // Re-check under the per-channel lock: a concurrent caller may have
        // populated the cell while we waited.
        if let Some(hook) = slot.as_ref() {
            return Ok(hook.clone());
        }

        let hook = self.discover_or_create(channel).await?;
        *slot = Some(hook.clone());
        Ok(hook)
    }

    /// Drop the cached resource for a channel (e.g. after a 404 on send).
    pub async fn invalidate(&self, channel: ChannelId) {
        let mut cells = self.cells.lock().await;
        cells.remove(&channel);
    }

    async fn discover_or_create(&self, channel: ChannelId) -> Result<WebhookInfo, ChatError> {
        for hook in self.client.list_webhooks(channel).await? {
            let ours = match (self.own_user, hook.owner_id) {
                (Some(me), Some(owner)) => me == owner,
                // Ownership unknown; go by name alone.
                _ => true,
            };
            if hook.name == WEBHOOK_NAME && ours {
                debug!(channel = %channel, webhook = hook.id, "reusing existing webhook");
                return Ok(hook);
            }
        }

        info!(channel = %channel, "creating inline webhook");
        self.client.create_webhook(channel, WEBHOOK_NAME).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use polyglot_core::{GuildId, MessageId};
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::chat::{ChannelInfo, ChannelKind, SentMessage, ThreadInfo, WebhookPost};

    /// Counts creation calls; returns a fresh webhook per creation.
    struct CountingClient {
        creations: AtomicU64,
        existing: Vec<WebhookInfo>,
    }

    impl CountingClient {
        fn new(existing: Vec<WebhookInfo>) -> Self {
            Self {
                creations: AtomicU64::new(0),
                existing,
            }
        }
    }

    #[async_trait]
    impl ChatClient for CountingClient {
        async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, ChatError> {
            Ok(ChannelInfo { id: channel, guild_id: Some(GuildId(1)), kind: ChannelKind::Text })
        }

        async fn send_message(&self, channel: ChannelId, _: &str) -> Result<SentMessage, ChatError> {
            Ok(SentMessage { id: MessageId(1), channel_id: channel })
        }

        async fn create_thread(&self, channel: ChannelId, name: &str) -> Result<ThreadInfo, ChatError> {
            Ok(ThreadInfo { id: ChannelId(900), name: name.to_string(), parent_id: channel })
        }

        async fn list_threads(&self, _: ChannelId) -> Result<Vec<ThreadInfo>, ChatError> {
            Ok(vec![])
        }

        async fn create_webhook(&self, _: ChannelId, name: &str) -> Result<WebhookInfo, ChatError> {
            // Yield first so two racing creators would interleave if the
            // manager failed to serialize them.
            tokio::task::yield_now().await;
            let n = self.creations.fetch_add(1, Ordering::SeqCst);
            Ok(WebhookInfo { id: 100 + n, token: "tok".into(), name: name.to_string(), owner_id: None })
        }

        async fn list_webhooks(&self, _: ChannelId) -> Result<Vec<WebhookInfo>, ChatError> {
            Ok(self.existing.clone())
        }

        async fn send_via_webhook(&self, _: &WebhookInfo, _: WebhookPost) -> Result<SentMessage, ChatError> {
            Ok(SentMessage { id: MessageId(2), channel_id: ChannelId(1) })
        }

        async fn create_dm_channel(&self, _: UserId) -> Result<ChannelId, ChatError> {
            Ok(ChannelId(555))
        }

        async fn delete_message(&self, _: ChannelId, _: MessageId) -> Result<(), ChatError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn concurrent_ensure_creates_exactly_once() {
        let client = Arc::new(CountingClient::new(vec![]));
        let manager = Arc::new(WebhookManager::new(client.clone(), None));

        let a = {
            let m = manager.clone();
            tokio::spawn(async move { m.ensure(ChannelId(7)).await.unwrap() })
        };
        let b = {
            let m = manager.clone();
            tokio::spawn(async move { m.ensure(ChannelId(7)).await.unwrap() })
        };

        let (first, second) = (a.await.unwrap(), b.await.unwrap());
        assert_eq!(first, second);
        assert_eq!(client.creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_channels_get_distinct_webhooks() {
        let client = Arc::new(CountingClient::new(vec![]));
        let manager = WebhookManager::new(client.clone(), None);

        let one = manager.ensure(ChannelId(1)).await.unwrap();
        let two = manager.ensure(ChannelId(2)).await.unwrap();
        assert_ne!(one.id, two.id);
        assert_eq!(client.creations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn existing_named_webhook_is_reused() {
        let existing = WebhookInfo {
            id: 42,
            token: "tok".into(),
            name: WEBHOOK_NAME.to_string(),
            owner_id: Some(UserId(10)),
        };
        let client = Arc::new(CountingClient::new(vec![existing.clone()]));
        let manager = WebhookManager::new(client.clone(), Some(UserId(10)));

        let hook = manager.ensure(ChannelId(3)).await.unwrap();
        assert_eq!(hook, existing);
        assert_eq!(client.creations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn foreign_webhook_with_same_name_is_ignored() {
        let foreign = WebhookInfo {
            id: 42,
            token: "tok".into(),
            name: WEBHOOK_NAME.to_string(),
            owner_id: Some(UserId(99)),
        };
        let client = Arc::new(CountingClient::new(vec![foreign]));
        let manager = WebhookManager::new(client.clone(), Some(UserId(10)));

        let hook = manager.ensure(ChannelId(3)).await.unwrap();
        assert_eq!(hook.id, 100);
        assert_eq!(client.creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_rediscovery() {
        let client = Arc::new(CountingClient::new(vec![]));
        let manager = WebhookManager::new(client.clone(), None);

        manager.ensure(ChannelId(5)).await.unwrap();
        manager.invalidate(ChannelId(5)).await;
        manager.ensure(ChannelId(5)).await.unwrap();
        assert_eq!(client.creations.load(Ordering::SeqCst), 2);
    }
}
