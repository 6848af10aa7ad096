//! Join request event handler.
//!
//! Approves every chat join request, enrolls the user as a subscriber and
//! sends them a private welcome message with a link button.

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::ChatJoinRequest;
use tracing::{debug, info, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::bot::messenger::{Delivery, LinkButton, Messenger};
use crate::database::SubscriberStore;
use crate::error::BotError;

const WELCOME_BUTTON: &str = "🚀 Open Link";

/// Returns the handler for join request updates.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_chat_join_request().endpoint(join_request_handler)
}

/// The parts of a join request the approval flow needs.
#[derive(Debug, Clone)]
pub struct Applicant {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub full_name: String,
}

impl From<&ChatJoinRequest> for Applicant {
    fn from(request: &ChatJoinRequest) -> Self {
        Self {
            chat_id: request.chat.id,
            user_id: request.from.id,
            full_name: request.from.full_name(),
        }
    }
}

/// Result of a successful approval.
#[derive(Debug)]
pub struct JoinOutcome {
    /// Whether the user was not yet a subscriber.
    pub newly_recorded: bool,
    /// Whether the private welcome message reached the user.
    pub welcome: Delivery,
}

pub fn welcome_text(full_name: &str) -> String {
    format!(
        "👋 Welcome, {}!\nClick the button below to get started:",
        full_name
    )
}

/// Approve, record, then welcome.
///
/// Approval and recording failures abort. A failed welcome does not:
/// the user stays approved and the failure is reported in the outcome.
pub async fn approve_and_welcome<M>(
    messenger: &M,
    store: &dyn SubscriberStore,
    welcome_link: &url::Url,
    applicant: &Applicant,
) -> Result<JoinOutcome, BotError>
where
    M: Messenger + ?Sized,
{
    messenger
        .approve_join_request(applicant.chat_id, applicant.user_id)
        .await
        .map_err(BotError::Approval)?;
    info!(
        "Approved {} ({}) in chat {}",
        applicant.full_name, applicant.user_id, applicant.chat_id
    );

    let newly_recorded = store
        .save(applicant.user_id.0, Some(&applicant.full_name))
        .await?;

    let button = LinkButton::new(WELCOME_BUTTON, welcome_link.clone());
    let welcome: Delivery = messenger
        .send_message(
            ChatId::from(applicant.user_id),
            &welcome_text(&applicant.full_name),
            Some(&button),
        )
        .await
        .into();

    if let Delivery::Failed(e) = &welcome {
        warn!("Couldn't send welcome to {}: {}", applicant.user_id, e);
    }

    Ok(JoinOutcome {
        newly_recorded,
        welcome,
    })
}

async fn join_request_handler(
    bot: ThrottledBot,
    request: ChatJoinRequest,
    state: AppState,
) -> anyhow::Result<()> {
    let applicant = Applicant::from(&request);
    let outcome =
        approve_and_welcome(&bot, state.store.as_ref(), &state.welcome_link, &applicant).await?;

    debug!(
        "Join request from {} handled (new subscriber: {}, welcomed: {})",
        applicant.user_id,
        outcome.newly_recorded,
        outcome.welcome.is_sent()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::messenger::testing::{Call, RecordingMessenger};
    use crate::database::MemoryStore;

    fn link() -> url::Url {
        url::Url::parse("https://example.com/start").unwrap()
    }

    fn applicant(user: u64) -> Applicant {
        Applicant {
            chat_id: ChatId(-100500),
            user_id: UserId(user),
            full_name: format!("User {}", user),
        }
    }

    #[tokio::test]
    async fn test_approves_records_and_welcomes() {
        let messenger = RecordingMessenger::new();
        let store = MemoryStore::default();

        let outcome = approve_and_welcome(&messenger, &store, &link(), &applicant(7))
            .await
            .unwrap();

        assert!(outcome.newly_recorded);
        assert!(outcome.welcome.is_sent());
        assert_eq!(store.ids(), vec![7]);
        assert_eq!(
            messenger.calls(),
            vec![
                Call::Approve { chat: -100500, user: 7 },
                Call::Text {
                    to: 7,
                    text: "👋 Welcome, User 7!\nClick the button below to get started:"
                        .to_string(),
                    button: Some("https://example.com/start".to_string()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_distinct_requests_each_approved_once() {
        let messenger = RecordingMessenger::new();
        let store = MemoryStore::default();

        for user in 1..=5 {
            approve_and_welcome(&messenger, &store, &link(), &applicant(user))
                .await
                .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 5);
        for user in 1..=5 {
            let approvals = messenger
                .calls()
                .iter()
                .filter(|c| **c == Call::Approve { chat: -100500, user })
                .count();
            assert_eq!(approvals, 1);
        }
    }

    #[tokio::test]
    async fn test_repeat_request_is_not_recorded_twice() {
        let messenger = RecordingMessenger::new();
        let store = MemoryStore::default();

        let first = approve_and_welcome(&messenger, &store, &link(), &applicant(3))
            .await
            .unwrap();
        let second = approve_and_welcome(&messenger, &store, &link(), &applicant(3))
            .await
            .unwrap();

        assert!(first.newly_recorded);
        assert!(!second.newly_recorded);
        assert_eq!(store.ids(), vec![3]);
    }

    #[tokio::test]
    async fn test_failed_approval_records_nothing() {
        let messenger = RecordingMessenger::rejecting_approvals();
        let store = MemoryStore::default();

        let result = approve_and_welcome(&messenger, &store, &link(), &applicant(9)).await;

        assert!(matches!(result, Err(BotError::Approval(_))));
        assert!(store.ids().is_empty());
        assert_eq!(messenger.calls(), vec![Call::Approve { chat: -100500, user: 9 }]);
    }

    #[tokio::test]
    async fn test_failed_welcome_keeps_approval() {
        let messenger = RecordingMessenger::blocking(&[4]);
        let store = MemoryStore::default();

        let outcome = approve_and_welcome(&messenger, &store, &link(), &applicant(4))
            .await
            .unwrap();

        assert!(matches!(outcome.welcome, Delivery::Failed(_)));
        assert_eq!(store.ids(), vec![4]);
    }
}
