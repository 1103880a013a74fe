//! Club Gate server binary.
//!
//! Loads configuration, wires the adapters, registers the webhook, and runs
//! the HTTP server and the scheduler until Ctrl-C.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use club_gate::adapters::http::{webhook_router, WebhookAppState};
use club_gate::adapters::sqlite::{self, SqliteSubscriptionStore};
use club_gate::adapters::telegram::{TelegramClient, TelegramConfig};
use club_gate::application::{
    BackupExporter, Dispatcher, LifecycleEngine, PendingProofRegistry, Scheduler,
};
use club_gate::application::pending_proofs::DEFAULT_PROOF_CAPACITY;
use club_gate::config::{AppConfig, ServerConfig};
use club_gate::ports::{ChatPlatform, SubscriptionStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.server);

    tracing::info!(environment = ?config.server.environment, "Starting club-gate");

    // Storage
    let pool = sqlite::connect(&config.database.url, config.database.max_connections).await?;
    if config.database.run_migrations {
        sqlite::run_migrations(&pool).await?;
    }
    let store: Arc<dyn SubscriptionStore> = Arc::new(SqliteSubscriptionStore::new(pool));

    // Chat platform
    let telegram = Arc::new(TelegramClient::new(
        TelegramConfig::new(config.telegram.bot_token.clone())
            .with_base_url(config.telegram.api_base_url.clone()),
    ));
    telegram
        .set_webhook(&config.webhook.url(), &config.webhook.secret)
        .await?;
    tracing::info!(path = %config.webhook.path, "Webhook registered");
    let platform: Arc<dyn ChatPlatform> = telegram;

    // Workflows
    let settings = config.bot_settings()?;
    let proofs = Arc::new(PendingProofRegistry::new(
        config.schedule.pending_proof_ttl(),
        DEFAULT_PROOF_CAPACITY,
    ));
    let engine = Arc::new(LifecycleEngine::new(
        store.clone(),
        platform.clone(),
        settings.group_id,
        settings.admin_chat(),
        settings.policy,
    ));
    let exporter = Arc::new(BackupExporter::new(
        store.clone(),
        platform.clone(),
        settings.admin_chat(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        settings,
        store,
        platform,
        proofs.clone(),
        engine.clone(),
        exporter.clone(),
    ));

    // Background jobs
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(engine, exporter, proofs, config.schedule.schedule()?);
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    // HTTP
    let state = WebhookAppState::new(config.webhook.secret.clone(), dispatcher);
    let app = webhook_router(&config.webhook.path, state);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    scheduler_task.await?;
    tracing::info!("Stopped");
    Ok(())
}

/// JSON logs in production, human-readable otherwise.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
