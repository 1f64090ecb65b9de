//! The translation job queue and its worker task.
//!
//! Jobs enter through [`Relay::enqueue`] (an unbounded mpsc sender) and are
//! drained by a single [`Worker`] task, strictly in arrival order.  One
//! worker is a deliberate choice: per-channel output ordering falls out of
//! FIFO consumption with no further coordination, and the translator
//! registry is serialized anyway.
//!
//! A failed job is logged with its failure category and dropped; the loop
//! itself never stops until the queue side is closed.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use polyglot_core::{
    apply_glossary, compile_glossary, restore, ChannelId, DeliveryKind, GuildId, MessageId,
    SpanExtractor, UserId,
};
use polyglot_translate::{Provider, TranslationPayload, TranslatorRegistry};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chat::{ChatClient, SentMessage, WebhookPost};
use crate::error::{ChatError, RelayError};
use crate::format::{clamp_length, defuse_mentions, stitch_translation, MESSAGE_LIMIT};
use crate::metrics::Metrics;
use crate::threads::ThreadDirectory;
use crate::webhooks::WebhookManager;
use crate::SharedDb;

/// Blended per-character cost estimate across providers, used only for the
/// usage ledger.
const COST_PER_CHAR_USD: f64 = 20.0 / 1_000_000.0;

/// One unit of translation work, fully resolved by the event layer.
#[derive(Debug, Clone)]
pub struct TranslationJob {
    pub message_id: MessageId,
    pub guild_id: GuildId,
    /// Channel the original message lives in.
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    /// Detected source language, empty when detection was inconclusive.
    pub source_lang: String,
    pub target_lang: String,
    pub kind: DeliveryKind,
    /// DM recipient; falls back to the author when unset.
    pub recipient: Option<UserId>,
    /// Jump link back to the original message.
    pub reference_url: Option<String>,
}

/// Producer half of the job queue, cloned into every event handler.
#[derive(Clone)]
pub struct Relay {
    tx: mpsc::UnboundedSender<TranslationJob>,
}

impl Relay {
    pub fn enqueue(&self, job: TranslationJob) {
        // Send only fails once the worker is gone, i.e. during shutdown.
        if self.tx.send(job).is_err() {
            warn!("dropping job: worker has shut down");
        }
    }
}

/// Build the queue pair.  The receiver goes straight into [`Worker::new`].
pub fn queue() -> (Relay, mpsc::UnboundedReceiver<TranslationJob>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Relay { tx }, rx)
}

/// The single consumer of the job queue.
pub struct Worker {
    rx: mpsc::UnboundedReceiver<TranslationJob>,
    db: SharedDb,
    registry: Arc<TranslatorRegistry>,
    chat: Arc<dyn ChatClient>,
    webhooks: WebhookManager,
    threads: ThreadDirectory,
    extractor: SpanExtractor,
    metrics: Arc<Metrics>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rx: mpsc::UnboundedReceiver<TranslationJob>,
        db: SharedDb,
        registry: Arc<TranslatorRegistry>,
        chat: Arc<dyn ChatClient>,
        webhooks: WebhookManager,
        threads: ThreadDirectory,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            rx,
            db,
            registry,
            chat,
            webhooks,
            threads,
            extractor: SpanExtractor::new(),
            metrics,
        }
    }

    /// Drain the queue until every sender is dropped.
    pub async fn run(mut self) {
        info!("translation worker started");
        while let Some(job) = self.rx.recv().await {
            debug!(depth = self.rx.len(), message = %job.message_id, "picked up job");
            let message_id = job.message_id;
            let target = job.target_lang.clone();
            match self.process(job).await {
                Ok(()) => {
                    self.metrics.jobs_processed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.metrics.jobs_failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        message = %message_id,
                        target = %target,
                        category = %e.category(),
                        error = %e,
                        "job failed"
                    );
                }
            }
        }
        info!("translation worker stopped: queue closed");
    }

    async fn process(&self, job: TranslationJob) -> Result<(), RelayError> {
        // Synchronous store reads; the lock is never held across an await.
        let rules = {
            let db = self.db.lock().await;
            let terms = db.list_glossary_terms(job.guild_id)?;
            compile_glossary(&terms)
        };

        let (masked, spans) = self.extractor.extract(&job.content);

        let payload = TranslationPayload::new(&masked, &job.source_lang, &job.target_lang);
        let outcome = self.registry.translate(&payload).await;

        if outcome.provider == Provider::Echo {
            // No providers configured; the text goes out untranslated.
            self.metrics.passthroughs.fetch_add(1, Ordering::Relaxed);
        }

        let glossed = apply_glossary(&outcome.text, &rules);

        // A provider that mangled a placeholder fails the whole job; posting
        // a message with spans missing would corrupt the untranslatable
        // regions it was supposed to protect.
        let restored = restore(&glossed, &spans)?;

        let stitched = stitch_translation(job.reference_url.as_deref(), &restored);
        let content = clamp_length(&stitched, MESSAGE_LIMIT);

        let sent = self.dispatch(&job, &content).await?;

        {
            let db = self.db.lock().await;
            db.insert_message_mapping(
                job.guild_id,
                sent.channel_id,
                job.message_id,
                sent.id,
                &job.target_lang,
                job.kind,
            )?;
            db.increment_usage(
                job.guild_id,
                outcome.char_count as i64,
                outcome.char_count as f64 * COST_PER_CHAR_USD,
            )?;
        }

        self.metrics.observe_latency(outcome.latency.as_secs_f64());
        debug!(
            message = %job.message_id,
            translated = %sent.id,
            provider = %outcome.provider,
            target = %job.target_lang,
            kind = job.kind.as_str(),
            "job dispatched"
        );
        Ok(())
    }

    /// Deliver the final content through the job's delivery kind.  A stale
    /// cached resource (404 on use) is invalidated and retried once.
    async fn dispatch(&self, job: &TranslationJob, content: &str) -> Result<SentMessage, RelayError> {
        match job.kind {
            DeliveryKind::Inline => {
                let post = WebhookPost {
                    content: defuse_mentions(content),
                    username: format!("{} \u{21B3} {}", job.author_name, job.target_lang.to_uppercase()),
                    avatar_url: job.author_avatar.clone(),
                };
                let hook = match self.webhooks.ensure(job.channel_id).await {
                    Ok(hook) => hook,
                    Err(e) => {
                        // Missing manage-webhooks permission, most likely.
                        // Degrade to a plain send rather than dropping the job.
                        warn!(channel = %job.channel_id, error = %e, "webhook unavailable, plain send fallback");
                        return Ok(self.chat.send_message(job.channel_id, content).await?);
                    }
                };
                match self.chat.send_via_webhook(&hook, post.clone()).await {
                    Ok(sent) => Ok(sent),
                    Err(e) if e.is_not_found() => {
                        self.webhooks.invalidate(job.channel_id).await;
                        let hook = self.webhooks.ensure(job.channel_id).await?;
                        Ok(self.chat.send_via_webhook(&hook, post).await?)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            DeliveryKind::Threaded => {
                let thread = match self.threads.ensure(job.channel_id).await {
                    Ok(thread) => thread,
                    Err(e) => {
                        warn!(channel = %job.channel_id, error = %e, "thread unavailable, plain send fallback");
                        return Ok(self.chat.send_message(job.channel_id, content).await?);
                    }
                };
                match self.chat.send_message(thread, content).await {
                    Ok(sent) => Ok(sent),
                    Err(e) if e.is_not_found() => {
                        self.threads.invalidate(job.channel_id).await;
                        let thread = self.threads.ensure(job.channel_id).await?;
                        Ok(self.chat.send_message(thread, content).await?)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            DeliveryKind::Dm => {
                let recipient = job.recipient.unwrap_or(job.author_id);
                let dm = match self.chat.create_dm_channel(recipient).await {
                    Ok(channel) => channel,
                    Err(ChatError::NotFound) => return Err(RelayError::DmUnresolvable(recipient)),
                    Err(e) => return Err(e.into()),
                };
                Ok(self.chat.send_message(dm, content).await?)
            }
        }
    }
}
