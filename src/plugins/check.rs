//! /check command plugin.
//!
//! Liveness acknowledgment. Reads no state.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

use crate::bot::dispatcher::ThrottledBot;

pub const ALIVE_TEXT: &str = "✅ Bot is alive!";

/// Handle the /check command.
pub async fn check_command(bot: ThrottledBot, msg: Message) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, ALIVE_TEXT)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}
