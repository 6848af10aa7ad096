//! Bot runtime - Polling and Webhook runners.

use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::types::AllowedUpdate;
use teloxide::update_listeners::Polling;
use tracing::info;

use super::dispatcher::{BotDispatcher, ThrottledBot};
use super::webhook;
use crate::config::{BotMode, Config};

/// Update kinds requested from Telegram when polling.
pub fn allowed_updates() -> Vec<AllowedUpdate> {
    vec![AllowedUpdate::Message, AllowedUpdate::ChatJoinRequest]
}

/// Run the bot with the configured mode until shutdown.
pub async fn run(
    config: &Config,
    bot: ThrottledBot,
    mut dispatcher: BotDispatcher,
) -> anyhow::Result<()> {
    match config.bot_mode {
        BotMode::Polling => {
            info!("Starting bot in polling mode...");
            let listener = Polling::builder(bot)
                .allowed_updates(allowed_updates())
                .delete_webhook()
                .await
                .build();
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("Error from the update listener"),
                )
                .await;
        }
        BotMode::Webhook => {
            info!("Starting bot in webhook mode...");
            webhook::start_webhook(config, dispatcher, bot).await?;
        }
    }

    info!("Bot stopped");
    Ok(())
}
