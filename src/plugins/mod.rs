//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod broadcast;
pub mod check;
pub mod start;
pub mod stats;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::ThrottledBot;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Subscribe and show what this bot does")]
    Start(String),

    #[command(description = "Show this help")]
    Help,

    #[command(description = "Check that the bot is alive")]
    Check,

    // Admin commands
    #[command(description = "Subscriber count (admin)")]
    Stats,

    #[command(description = "Broadcast your next message to all subscribers (admin)")]
    Broadcast,

    #[command(description = "Cancel a pending broadcast (admin)")]
    Cancel,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(payload)].endpoint(start::start_handler))
        .branch(case![Command::Help].endpoint(handle_help))
        .branch(case![Command::Check].endpoint(check::check_command))
        .branch(case![Command::Stats].endpoint(stats::stats_command))
        .branch(case![Command::Broadcast].endpoint(broadcast::broadcast_command))
        .branch(case![Command::Cancel].endpoint(broadcast::cancel_command))
}

/// Build the handler that captures pending broadcast content.
///
/// Must run after `command_handler()` so commands are never captured.
pub fn broadcast_capture_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(broadcast::is_pending_content).endpoint(broadcast::capture_handler)
}

/// Handle /help command.
async fn handle_help(bot: ThrottledBot, msg: Message) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}
