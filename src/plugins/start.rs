//! /start command plugin.
//!
//! Enrolls the caller as a subscriber and sends the bot description.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, User};
use tracing::debug;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::SubscriberStore;
use crate::error::StoreResult;

const START_TEXT: &str = r#"👋 Welcome to EM Files Bot\!

📢 Add me to your channel or group as an *Admin*\.
✅ I will auto\-accept join requests for you\."#;

/// Record `user` as a subscriber.
///
/// Returns `true` when the user was not stored before.
pub async fn enroll(store: &dyn SubscriberStore, user: &User) -> StoreResult<bool> {
    let created = store.save(user.id.0, Some(&user.full_name())).await?;
    debug!("Enrolled {} via /start (new: {})", user.id, created);
    Ok(created)
}

/// Handle the /start command.
pub async fn start_handler(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if let Some(user) = msg.from.as_ref() {
        enroll(state.store.as_ref(), user).await?;
    }

    bot.send_message(msg.chat.id, START_TEXT)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::error::StoreError;

    fn user(id: u64) -> User {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "is_bot": false,
            "first_name": "Ann",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_enroll_twice_records_once() {
        let store = MemoryStore::default();

        assert!(enroll(&store, &user(5)).await.unwrap());
        assert!(!enroll(&store, &user(5)).await.unwrap());
        assert_eq!(store.ids(), vec![5]);
    }

    #[tokio::test]
    async fn test_enroll_propagates_store_failure() {
        let store = MemoryStore::unwritable();

        let result = enroll(&store, &user(5)).await;

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.ids().is_empty());
    }
}
