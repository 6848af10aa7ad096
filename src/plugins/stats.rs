//! /stats command plugin.
//!
//! Admin-only subscriber count.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::SubscriberStore;
use crate::error::BotError;
use crate::plugins::broadcast::DENIED_TEXT;

/// Build the stats reply for `caller`.
pub async fn stats_text(
    store: &dyn SubscriberStore,
    admin_id: u64,
    caller: u64,
) -> Result<String, BotError> {
    if caller != admin_id {
        return Err(BotError::Unauthorized(caller));
    }

    let count = store.count().await?;
    Ok(format!("📊 Total subscribers: {}", count))
}

/// Handle the /stats command.
pub async fn stats_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = match stats_text(state.store.as_ref(), state.admin_id, user.id.0).await {
        Ok(text) => text,
        Err(BotError::Unauthorized(_)) => DENIED_TEXT.to_string(),
        Err(e) => return Err(e.into()),
    };

    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn test_admin_sees_count() {
        let store = MemoryStore::with_ids(&[1, 2, 3]);
        let text = stats_text(&store, 42, 42).await.unwrap();
        assert_eq!(text, "📊 Total subscribers: 3");
    }

    #[tokio::test]
    async fn test_non_admin_denied() {
        let store = MemoryStore::with_ids(&[1]);
        let result = stats_text(&store, 42, 5).await;
        assert!(matches!(result, Err(BotError::Unauthorized(5))));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryStore::unreadable();
        let result = stats_text(&store, 42, 42).await;
        assert!(matches!(result, Err(BotError::Store(_))));
    }
}
