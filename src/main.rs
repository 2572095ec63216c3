//! bili-relay — Binary Entrypoint
//! Wires the configured pollers and notification channels into the bot and
//! runs until a shutdown signal arrives.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bili_relay::bili::live::LiveSource;
use bili_relay::bili::space::SpaceSource;
use bili_relay::fetch::{Fetcher, HttpFetcher};
use bili_relay::{config, metrics, Bot, EmailSender, WebhookNotifier};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default()?;
    metrics::install(cfg.metrics_listen.as_deref())?;

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
    let interval = cfg.poll_interval();

    let mut bot = Bot::new(cfg.queue_cap);
    if !cfg.live_uids.is_empty() {
        bot.add_source(LiveSource::new(
            cfg.live_uids.clone(),
            Arc::clone(&fetcher),
            interval,
        ));
    }
    if !cfg.space_uids.is_empty() {
        bot.add_source(SpaceSource::new(
            cfg.space_uids.clone(),
            Arc::clone(&fetcher),
            interval,
        ));
    }
    if cfg.live_uids.is_empty() && cfg.space_uids.is_empty() {
        tracing::warn!("no tracked accounts configured; nothing to poll");
    }

    let mut outputs = 0;
    if let Some(webhook) = WebhookNotifier::from_env() {
        bot.add_output(webhook);
        outputs += 1;
    }
    if let Some(email) = EmailSender::from_env()? {
        bot.add_output(email);
        outputs += 1;
    }
    if outputs == 0 {
        tracing::warn!("no outputs configured; detected changes will only be logged");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                cancel.cancel();
            }
        }
    });

    bot.run(cancel).await;
    Ok(())
}
