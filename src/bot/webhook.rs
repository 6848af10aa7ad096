//! Webhook mode implementation for the bot.
//!
//! Uses teloxide's axum webhook support to:
//! - Call `setWebhook` on Telegram at start-up
//! - Serve updates from an axum HTTP server, plus `GET /health`
//! - Call `deleteWebhook` on shutdown

use std::net::SocketAddr;

use axum::routing::get;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::{error, info};

use super::dispatcher::{BotDispatcher, ThrottledBot};
use crate::config::Config;
use crate::error::ConfigError;

/// Start the bot in webhook mode.
///
/// Returns once the dispatcher stops (Ctrl+C) and the HTTP server has
/// been asked to shut down.
pub async fn start_webhook(
    config: &Config,
    mut dispatcher: BotDispatcher,
    bot: ThrottledBot,
) -> anyhow::Result<()> {
    let url = config
        .webhook_url
        .clone()
        .ok_or(ConfigError::Missing("WEBHOOK_URL"))?;

    // Listen on all interfaces at the configured port
    let address = SocketAddr::from(([0, 0, 0, 0], config.webhook_port));

    let mut options = Options::new(address, url.clone());
    if let Some(ref secret) = config.webhook_secret {
        options = options.secret_token(secret.clone());
        info!("Webhook secret token configured");
    }

    info!("🔗 Setting webhook URL: {}", url);

    // Webhook setup only needs the unthrottled bot
    let (listener, stop_flag, router) = webhooks::axum_to_router(bot.inner().clone(), options).await?;
    let app = router.route("/health", get(health));

    let tcp = tokio::net::TcpListener::bind(address).await?;
    info!("📡 Listening on: {}", address);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
            error!("Webhook server error: {}", e);
        }
    });

    info!("✅ Webhook setup complete, waiting for updates...");

    dispatcher
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Error from update listener"),
        )
        .await;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
