//! Per-channel translation-thread cache.
//!
//! Threaded delivery posts into one well-known thread per channel.  The
//! thread id is cached with the same per-channel double-checked locking as
//! the webhook cache; when a cached id turns out to be stale (the thread was
//! archived or deleted), callers invalidate the entry and the next `ensure`
//! re-validates against the live thread list before creating a new one.

use std::collections::HashMap;
use std::sync::Arc;

use polyglot_core::ChannelId;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::chat::ChatClient;
use crate::error::ChatError;

/// Well-known name of the per-channel translation thread.
pub const THREAD_NAME: &str = "\u{1F310}-translations";

type Cell = Arc<Mutex<Option<ChannelId>>>;

pub struct ThreadDirectory {
    client: Arc<dyn ChatClient>,
    cells: Mutex<HashMap<ChannelId, Cell>>,
}

impl ThreadDirectory {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the channel's translation-thread id, finding or creating the
    /// thread on first use.
    pub async fn ensure(&self, channel: ChannelId) -> Result<ChannelId, ChatError> {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells.entry(channel).or_default().clone()
        };

        let mut slot = cell.lock().await;
        if let Some(thread_id) = *slot {
            return Ok(thread_id);
        }

        for thread in self.client.list_threads(channel).await? {
            if thread.name == THREAD_NAME {
                debug!(channel = %channel, thread = %thread.id, "reusing translation thread");
                *slot = Some(thread.id);
                return Ok(thread.id);
            }
        }

        info!(channel = %channel, "creating translation thread");
        let thread = self.client.create_thread(channel, THREAD_NAME).await?;
        *slot = Some(thread.id);
        Ok(thread.id)
    }

    /// Drop a stale cache entry so the next `ensure` re-validates.
    pub async fn invalidate(&self, channel: ChannelId) {
        let mut cells = self.cells.lock().await;
        cells.remove(&channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use polyglot_core::{GuildId, MessageId, UserId};
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::chat::{ChannelInfo, ChannelKind, SentMessage, ThreadInfo, WebhookInfo, WebhookPost};

    struct ThreadClient {
        creations: AtomicU64,
        live: std::sync::Mutex<Vec<ThreadInfo>>,
    }

    impl ThreadClient {
        fn new(live: Vec<ThreadInfo>) -> Self {
            Self {
                creations: AtomicU64::new(0),
                live: std::sync::Mutex::new(live),
            }
        }
    }

    #[async_trait]
    impl ChatClient for ThreadClient {
        async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, ChatError> {
            Ok(ChannelInfo { id: channel, guild_id: Some(GuildId(1)), kind: ChannelKind::Text })
        }

        async fn send_message(&self, channel: ChannelId, _: &str) -> Result<SentMessage, ChatError> {
            Ok(SentMessage { id: MessageId(1), channel_id: channel })
        }

        async fn create_thread(&self, channel: ChannelId, name: &str) -> Result<ThreadInfo, ChatError> {
            let n = self.creations.fetch_add(1, Ordering::SeqCst);
            let thread = ThreadInfo {
                id: ChannelId(7000 + n),
                name: name.to_string(),
                parent_id: channel,
            };
            self.live.lock().unwrap().push(thread.clone());
            Ok(thread)
        }

        async fn list_threads(&self, _: ChannelId) -> Result<Vec<ThreadInfo>, ChatError> {
            Ok(self.live.lock().unwrap().clone())
        }

        async fn create_webhook(&self, _: ChannelId, _: &str) -> Result<WebhookInfo, ChatError> {
            unreachable!("not used in thread tests")
        }

        async fn list_webhooks(&self, _: ChannelId) -> Result<Vec<WebhookInfo>, ChatError> {
            Ok(vec![])
        }

        async fn send_via_webhook(&self, _: &WebhookInfo, _: WebhookPost) -> Result<SentMessage, ChatError> {
            unreachable!("not used in thread tests")
        }

        async fn create_dm_channel(&self, _: UserId) -> Result<ChannelId, ChatError> {
            Ok(ChannelId(555))
        }

        async fn delete_message(&self, _: ChannelId, _: MessageId) -> Result<(), ChatError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn creates_once_then_caches() {
        let client = Arc::new(ThreadClient::new(vec![]));
        let directory = ThreadDirectory::new(client.clone());

        let first = directory.ensure(ChannelId(1)).await.unwrap();
        let second = directory.ensure(ChannelId(1)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(client.creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn discovers_live_thread_by_name() {
        let existing = ThreadInfo {
            id: ChannelId(42),
            name: THREAD_NAME.to_string(),
            parent_id: ChannelId(1),
        };
        let client = Arc::new(ThreadClient::new(vec![existing]));
        let directory = ThreadDirectory::new(client.clone());

        assert_eq!(directory.ensure(ChannelId(1)).await.unwrap(), ChannelId(42));
        assert_eq!(client.creations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalidate_revalidates_against_live_list() {
        let client = Arc::new(ThreadClient::new(vec![]));
        let directory = ThreadDirectory::new(client.clone());

        let created = directory.ensure(ChannelId(1)).await.unwrap();
        directory.invalidate(ChannelId(1)).await;

        // The thread is still live, so re-validation finds it by name
        // instead of creating another.
        let found = directory.ensure(ChannelId(1)).await.unwrap();
        assert_eq!(created, found);
        assert_eq!(client.creations.load(Ordering::SeqCst), 1);
    }
}
