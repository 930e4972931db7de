//! Taskbell daemon: HTTP task API plus the due-task scanner.
//!
//! Config is read from `TASKBELL_CONFIG` when set, otherwise from
//! `config_dir()/config.toml`; missing files fall back to defaults.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use taskbell::notify::{LogNotifier, NotificationDispatcher, WebhookNotifier};
use taskbell::tasks::notification_channel;
use taskbell::{DueScanner, TaskManager, TaskServer, TaskStore, TrackerConfig};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("taskbell=info")),
        )
        .init();

    let config_path = std::env::var_os("TASKBELL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(TrackerConfig::default_config_path);
    let mut config = TrackerConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    config.apply_env_overrides()?;
    tracing::info!("taskbell starting (config: {})", config_path.display());

    let store = TaskStore::new(config.store.resolved_path());
    let manager = Arc::new(TaskManager::open(store)?.with_cooldown(config.scanner.cooldown()));

    let cancel = CancellationToken::new();
    let (tx, rx) = notification_channel(config.scanner.channel_capacity);

    let mut dispatcher = NotificationDispatcher::new(cancel.clone());
    if config.notifier.log {
        dispatcher = dispatcher.with_notifier(Arc::new(LogNotifier));
    }
    if let Some(url) = config.notifier.webhook_url.as_deref() {
        dispatcher = dispatcher.with_notifier(Arc::new(WebhookNotifier::new(url)?));
    }
    let dispatcher_handle = tokio::spawn(dispatcher.run(rx));

    let scanner_handle = DueScanner::new(Arc::clone(&manager), tx, cancel.clone())
        .with_tick_interval(config.scanner.tick_interval())
        .spawn();

    let server = TaskServer::start(manager, &config.server, cancel.clone()).await?;
    tracing::info!("task API available at http://{}/tasks", server.addr());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!("shutdown requested");
    cancel.cancel();

    server.join().await;
    match scanner_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("scanner exited with error: {e}"),
        Err(e) => tracing::error!("scanner task panicked: {e}"),
    }
    if let Err(e) = dispatcher_handle.await {
        tracing::error!("dispatcher task panicked: {e}");
    }

    tracing::info!("taskbell shut down cleanly");
    Ok(())
}
