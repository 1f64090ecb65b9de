//! Gateway event handling: message create, edit and delete.
//!
//! Handlers do the cheap, synchronous part of the pipeline — filtering,
//! settings resolution, language detection, job construction — and push the
//! expensive part onto the worker queue.  Nothing here awaits a provider.

use std::sync::Arc;

use polyglot_core::{ChannelId, DeliveryKind, GuildId, MessageId, UserId};
use tracing::{debug, warn};

use crate::chat::ChatClient;
use crate::detect::{is_supported, LanguageDetector};
use crate::error::RelayError;
use crate::worker::{Relay, TranslationJob};
use crate::SharedDb;

/// Host used in jump links back to the original message.
const JUMP_LINK_HOST: &str = "https://discord.com/channels";

/// A message create (or edit) as seen on the gateway.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub id: MessageId,
    /// Absent for direct messages, which the relay ignores.
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub author_is_bot: bool,
    pub content: String,
}

/// A message deletion as seen on the gateway.
#[derive(Debug, Clone, Copy)]
pub struct DeleteEvent {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

pub struct EventHandler {
    relay: Relay,
    db: SharedDb,
    chat: Arc<dyn ChatClient>,
    detector: Box<dyn LanguageDetector>,
    /// Fallback target language when neither channel nor guild sets one.
    default_lang: String,
    default_mode: String,
    /// Process-wide inline fan-out cap, used until a guild raises its own.
    inline_auto_max_langs: usize,
}

impl EventHandler {
    pub fn new(
        relay: Relay,
        db: SharedDb,
        chat: Arc<dyn ChatClient>,
        detector: Box<dyn LanguageDetector>,
        default_lang: String,
        default_mode: String,
        inline_auto_max_langs: usize,
    ) -> Self {
        Self {
            relay,
            db,
            chat,
            detector,
            default_lang,
            default_mode,
            inline_auto_max_langs: inline_auto_max_langs.max(1),
        }
    }

    /// Filter, resolve settings, detect the source language and enqueue one
    /// job per remaining target language.
    pub async fn handle_message(&self, event: &MessageEvent) -> Result<(), RelayError> {
        if event.author_is_bot || event.content.trim().is_empty() {
            return Ok(());
        }
        let Some(guild_id) = event.guild_id else {
            // Direct messages are never relayed.
            return Ok(());
        };

        let (override_row, guild) = {
            let db = self.db.lock().await;
            (
                db.get_channel_override(event.channel_id)?,
                db.get_or_create_guild(guild_id)?,
            )
        };

        if let Some(ov) = &override_row {
            if !ov.enabled {
                debug!(channel = %event.channel_id, "relay disabled for channel");
                return Ok(());
            }
        }

        let mode = override_row
            .as_ref()
            .and_then(|ov| ov.mode.clone())
            .unwrap_or_else(|| {
                if guild.default_mode.is_empty() {
                    self.default_mode.clone()
                } else {
                    guild.default_mode.clone()
                }
            });

        let mut targets: Vec<String> = override_row
            .as_ref()
            .map(|ov| ov.target_lang_list())
            .filter(|list| !list.is_empty())
            .or_else(|| guild.default_lang.clone().map(|lang| vec![lang]))
            .unwrap_or_else(|| vec![self.default_lang.clone()]);

        // An inconclusive detection yields an empty source code; jobs still
        // go out and the provider auto-detects.
        let detection = self.detector.detect(&event.content);
        if detection.language.is_empty() {
            debug!(message = %event.id, "language detection inconclusive, provider will auto-detect");
        }

        targets.retain(|lang| *lang != detection.language && is_supported(lang));
        targets.dedup();
        if targets.is_empty() {
            return Ok(());
        }

        let kind = match mode.as_str() {
            "inline_auto" => {
                // A guild that raised its own cap wins; an untouched guild
                // row falls back to the process-wide setting.
                let cap = if guild.inline_auto_max_langs > 1 {
                    guild.inline_auto_max_langs as usize
                } else {
                    self.inline_auto_max_langs
                };
                targets.truncate(cap);
                DeliveryKind::Inline
            }
            "dm_mirror" => {
                let author = {
                    let db = self.db.lock().await;
                    db.get_or_create_user(event.author_id)?
                };
                if !author.dm_mirror_enabled {
                    debug!(user = %event.author_id, "dm mirror not enabled, skipping");
                    return Ok(());
                }
                DeliveryKind::Dm
            }
            _ => DeliveryKind::Threaded,
        };

        let reference_url = format!(
            "{JUMP_LINK_HOST}/{guild_id}/{channel}/{message}",
            channel = event.channel_id,
            message = event.id,
        );

        for target_lang in targets {
            self.relay.enqueue(TranslationJob {
                message_id: event.id,
                guild_id,
                channel_id: event.channel_id,
                author_id: event.author_id,
                author_name: event.author_name.clone(),
                author_avatar: event.author_avatar.clone(),
                content: event.content.clone(),
                source_lang: detection.language.clone(),
                target_lang,
                kind,
                recipient: Some(event.author_id),
                reference_url: Some(reference_url.clone()),
            });
        }
        Ok(())
    }

    /// An edited original is simply re-translated; the fresh copies get their
    /// own mappings, and the old copies age out with retention cleanup.
    pub async fn handle_edit(&self, event: &MessageEvent) -> Result<(), RelayError> {
        debug!(message = %event.id, "re-translating edited message");
        self.handle_message(event).await
    }

    /// Cascade a deletion to every translated copy, then forget the
    /// mappings.  Copies that are already gone are not an error.
    pub async fn handle_delete(&self, event: &DeleteEvent) -> Result<(), RelayError> {
        let mappings = {
            let db = self.db.lock().await;
            db.mappings_for_original(event.message_id)?
        };
        if mappings.is_empty() {
            return Ok(());
        }

        for mapping in &mappings {
            match self
                .chat
                .delete_message(mapping.channel_id, mapping.translated_msg_id)
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(message = %mapping.translated_msg_id, "translated copy already gone");
                }
                Err(e) => {
                    warn!(
                        message = %mapping.translated_msg_id,
                        error = %e,
                        "failed to delete translated copy"
                    );
                }
            }
        }

        let db = self.db.lock().await;
        for mapping in &mappings {
            db.delete_message_mapping(mapping.id)?;
        }
        debug!(
            original = %event.message_id,
            copies = mappings.len(),
            "deletion propagated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use polyglot_store::Database;
    use std::sync::Mutex;

    use crate::chat::{ChannelInfo, ChannelKind, ChatClient, SentMessage, ThreadInfo, WebhookInfo, WebhookPost};
    use crate::detect::Detection;
    use crate::error::ChatError;
    use crate::worker::queue;

    struct FixedDetector(&'static str);

    impl LanguageDetector for FixedDetector {
        fn detect(&self, _: &str) -> Detection {
            Detection {
                language: self.0.to_string(),
                confidence: 0.99,
            }
        }
    }

    /// Records deletions; everything else is a stub.
    struct DeletionClient {
        deleted: Mutex<Vec<(ChannelId, MessageId)>>,
        missing: Vec<MessageId>,
    }

    impl DeletionClient {
        fn new(missing: Vec<MessageId>) -> Self {
            Self {
                deleted: Mutex::new(Vec::new()),
                missing,
            }
        }
    }

    #[async_trait]
    impl ChatClient for DeletionClient {
        async fn fetch_channel(&self, channel: ChannelId) -> Result<ChannelInfo, ChatError> {
            Ok(ChannelInfo { id: channel, guild_id: Some(GuildId(1)), kind: ChannelKind::Text })
        }

        async fn send_message(&self, channel: ChannelId, _: &str) -> Result<SentMessage, ChatError> {
            Ok(SentMessage { id: MessageId(1), channel_id: channel })
        }

        async fn create_thread(&self, channel: ChannelId, name: &str) -> Result<ThreadInfo, ChatError> {
            Ok(ThreadInfo { id: ChannelId(2), name: name.to_string(), parent_id: channel })
        }

        async fn list_threads(&self, _: ChannelId) -> Result<Vec<ThreadInfo>, ChatError> {
            Ok(vec![])
        }

        async fn create_webhook(&self, _: ChannelId, name: &str) -> Result<WebhookInfo, ChatError> {
            Ok(WebhookInfo { id: 1, token: "tok".into(), name: name.to_string(), owner_id: None })
        }

        async fn list_webhooks(&self, _: ChannelId) -> Result<Vec<WebhookInfo>, ChatError> {
            Ok(vec![])
        }

        async fn send_via_webhook(&self, _: &WebhookInfo, _: WebhookPost) -> Result<SentMessage, ChatError> {
            Ok(SentMessage { id: MessageId(3), channel_id: ChannelId(1) })
        }

        async fn create_dm_channel(&self, _: UserId) -> Result<ChannelId, ChatError> {
            Ok(ChannelId(4))
        }

        async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<(), ChatError> {
            if self.missing.contains(&message) {
                return Err(ChatError::NotFound);
            }
            self.deleted.lock().unwrap().push((channel, message));
            Ok(())
        }
    }

    fn handler(
        db: SharedDb,
        chat: Arc<dyn ChatClient>,
        lang: &'static str,
    ) -> (EventHandler, tokio::sync::mpsc::UnboundedReceiver<TranslationJob>) {
        let (relay, rx) = queue();
        let handler = EventHandler::new(
            relay,
            db,
            chat,
            Box::new(FixedDetector(lang)),
            "es".to_string(),
            "on_demand".to_string(),
            2,
        );
        (handler, rx)
    }

    fn event(content: &str) -> MessageEvent {
        MessageEvent {
            id: MessageId(100),
            guild_id: Some(GuildId(1)),
            channel_id: ChannelId(10),
            author_id: UserId(50),
            author_name: "alice".to_string(),
            author_avatar: None,
            author_is_bot: false,
            content: content.to_string(),
        }
    }

    fn in_memory() -> SharedDb {
        Arc::new(tokio::sync::Mutex::new(Database::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn message_in_foreign_language_enqueues_one_job() {
        let db = in_memory();
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        let (handler, mut rx) = handler(db, chat, "fr");

        handler.handle_message(&event("bonjour tout le monde")).await.unwrap();

        let job = rx.try_recv().unwrap();
        assert_eq!(job.source_lang, "fr");
        assert_eq!(job.target_lang, "es");
        assert_eq!(job.kind, DeliveryKind::Threaded);
        assert!(job.reference_url.as_deref().unwrap().contains("/1/10/100"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn inconclusive_detection_defers_to_provider() {
        let db = in_memory();
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        let (handler, mut rx) = handler(db, chat, "");

        handler.handle_message(&event("짧다")).await.unwrap();

        let job = rx.try_recv().unwrap();
        assert_eq!(job.source_lang, "");
        assert_eq!(job.target_lang, "es");
    }

    #[tokio::test]
    async fn message_already_in_target_language_is_skipped() {
        let db = in_memory();
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        let (handler, mut rx) = handler(db, chat, "es");

        handler.handle_message(&event("hola")).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn bots_and_empty_content_are_skipped() {
        let db = in_memory();
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        let (handler, mut rx) = handler(db, chat, "fr");

        let mut bot = event("bonjour");
        bot.author_is_bot = true;
        handler.handle_message(&bot).await.unwrap();

        handler.handle_message(&event("   ")).await.unwrap();

        let mut dm = event("bonjour");
        dm.guild_id = None;
        handler.handle_message(&dm).await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disabled_channel_override_suppresses_relay() {
        let db = in_memory();
        {
            let guard = db.lock().await;
            guard
                .upsert_channel_override(GuildId(1), ChannelId(10), Some(false), None, None)
                .unwrap();
        }
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        let (handler, mut rx) = handler(db, chat, "fr");

        handler.handle_message(&event("bonjour")).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn channel_override_langs_fan_out() {
        let db = in_memory();
        {
            let guard = db.lock().await;
            let langs = vec!["de".to_string(), "fr".to_string(), "ja".to_string()];
            guard
                .upsert_channel_override(GuildId(1), ChannelId(10), Some(true), None, Some(&langs))
                .unwrap();
        }
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        let (handler, mut rx) = handler(db, chat, "fr");

        handler.handle_message(&event("bonjour")).await.unwrap();

        let mut langs = Vec::new();
        while let Ok(job) = rx.try_recv() {
            langs.push(job.target_lang);
        }
        // The detected language is excluded from its own fan-out.
        assert_eq!(langs, vec!["de", "ja"]);
    }

    #[tokio::test]
    async fn inline_cap_prefers_config_until_guild_raises_it() {
        let db = in_memory();
        {
            let guard = db.lock().await;
            guard.set_guild_defaults(GuildId(1), None, Some("inline_auto")).unwrap();
            let langs = vec!["de".to_string(), "it".to_string(), "ja".to_string(), "pl".to_string()];
            guard
                .upsert_channel_override(GuildId(1), ChannelId(10), Some(true), None, Some(&langs))
                .unwrap();
        }
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        // Helper configures a process-wide inline cap of 2.
        let (handler, mut rx) = handler(db.clone(), chat, "fr");

        handler.handle_message(&event("bonjour")).await.unwrap();
        let mut langs = Vec::new();
        while let Ok(job) = rx.try_recv() {
            assert_eq!(job.kind, DeliveryKind::Inline);
            langs.push(job.target_lang);
        }
        assert_eq!(langs, vec!["de", "it"]);

        // A guild that raised its own cap overrides the process default.
        {
            let guard = db.lock().await;
            guard
                .conn()
                .execute("UPDATE guild_settings SET inline_auto_max_langs = 3 WHERE guild_id = 1", [])
                .unwrap();
        }
        handler.handle_message(&event("bonjour")).await.unwrap();
        let mut langs = Vec::new();
        while let Ok(job) = rx.try_recv() {
            langs.push(job.target_lang);
        }
        assert_eq!(langs, vec!["de", "it", "ja"]);
    }

    #[tokio::test]
    async fn dm_mirror_requires_opt_in() {
        let db = in_memory();
        {
            let guard = db.lock().await;
            guard.set_guild_defaults(GuildId(1), Some("es"), Some("dm_mirror")).unwrap();
        }
        let chat: Arc<dyn ChatClient> = Arc::new(DeletionClient::new(vec![]));
        let (handler, mut rx) = handler(db.clone(), chat, "fr");

        handler.handle_message(&event("bonjour")).await.unwrap();
        assert!(rx.try_recv().is_err());

        {
            let guard = db.lock().await;
            guard.set_user_dm_mirror(UserId(50), true).unwrap();
        }
        handler.handle_message(&event("bonjour")).await.unwrap();
        let job = rx.try_recv().unwrap();
        assert_eq!(job.kind, DeliveryKind::Dm);
        assert_eq!(job.recipient, Some(UserId(50)));
    }

    #[tokio::test]
    async fn delete_cascades_and_tolerates_missing_copies() {
        let db = in_memory();
        {
            let guard = db.lock().await;
            guard
                .insert_message_mapping(GuildId(1), ChannelId(2), MessageId(100), MessageId(200), "es", DeliveryKind::Threaded)
                .unwrap();
            guard
                .insert_message_mapping(GuildId(1), ChannelId(2), MessageId(100), MessageId(201), "fr", DeliveryKind::Threaded)
                .unwrap();
        }
        let client = Arc::new(DeletionClient::new(vec![MessageId(201)]));
        let chat: Arc<dyn ChatClient> = client.clone();
        let (handler, _rx) = handler(db.clone(), chat, "fr");

        handler
            .handle_delete(&DeleteEvent { channel_id: ChannelId(2), message_id: MessageId(100) })
            .await
            .unwrap();

        // The reachable copy was deleted; the missing one was tolerated.
        assert_eq!(client.deleted.lock().unwrap().as_slice(), &[(ChannelId(2), MessageId(200))]);
        let guard = db.lock().await;
        assert!(guard.mappings_for_original(MessageId(100)).unwrap().is_empty());
    }
}
