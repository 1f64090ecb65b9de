//! # polyglot-relay
//!
//! Relay binary: wires the store, the translator registry, the chat client
//! and the worker together, then waits for shutdown.
//!
//! Gateway events are expected to arrive through the [`EventHandler`]
//! embedded by whatever transport fronts this process; the binary itself
//! owns the pipeline, the periodic metrics snapshot and the lifecycle.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use polyglot_relay::config::RelayConfig;
use polyglot_relay::detect::WhatlangDetector;
use polyglot_relay::metrics::Metrics;
use polyglot_relay::rest::RestChatClient;
use polyglot_relay::threads::ThreadDirectory;
use polyglot_relay::webhooks::WebhookManager;
use polyglot_relay::worker::{queue, Worker};
use polyglot_relay::{ChatClient, EventHandler, SharedDb};
use polyglot_store::Database;
use polyglot_translate::TranslatorRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,polyglot_relay=debug")),
        )
        .init();

    info!("Starting Polyglot relay v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = RelayConfig::from_env();
    info!(
        api_base = %config.chat_api_base,
        database = %config.database_path.display(),
        default_lang = %config.default_guild_lang,
        default_mode = %config.default_mode,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Store (creates the parent directory and runs migrations)
    let db: SharedDb = Arc::new(tokio::sync::Mutex::new(Database::open_at(
        &config.database_path,
    )?));

    // Translator registry; providers with invalid configuration are skipped
    let registry = Arc::new(TranslatorRegistry::from_settings(&config.providers));
    info!(providers = ?registry.providers(), "Translator fallback order");

    // Chat platform client plus the cached delivery resources
    let chat: Arc<dyn ChatClient> =
        Arc::new(RestChatClient::new(&config.chat_api_base, &config.bot_token)?);
    let webhooks = WebhookManager::new(chat.clone(), None);
    let threads = ThreadDirectory::new(chat.clone());

    let metrics = Arc::new(Metrics::new());

    // -----------------------------------------------------------------------
    // 4. Spawn the worker and the metrics snapshot task
    // -----------------------------------------------------------------------
    let (relay, rx) = queue();
    let worker = Worker::new(
        rx,
        db.clone(),
        registry,
        chat.clone(),
        webhooks,
        threads,
        metrics.clone(),
    );
    let worker_handle = tokio::spawn(worker.run());

    let snapshot_metrics = metrics.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            info!(
                processed = snapshot_metrics.processed(),
                failed = snapshot_metrics.failed(),
                p50_latency_secs = snapshot_metrics.latency_percentile(0.5),
                p99_latency_secs = snapshot_metrics.latency_percentile(0.99),
                "Pipeline metrics snapshot"
            );
        }
    });

    // Event handler, handed to the gateway transport fronting this process.
    let events = EventHandler::new(
        relay.clone(),
        db,
        chat,
        Box::new(WhatlangDetector),
        config.default_guild_lang.clone(),
        config.default_mode.clone(),
        config.inline_auto_max_langs,
    );

    info!("Polyglot relay ready");

    // -----------------------------------------------------------------------
    // 5. Wait for shutdown
    // -----------------------------------------------------------------------
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, draining the queue");

    // Closing the producer side lets the worker finish in-flight jobs and
    // return once the queue is empty.
    drop(relay);
    drop(events);
    worker_handle.await?;

    info!("Polyglot relay stopped");
    Ok(())
}
