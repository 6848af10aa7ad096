//! Broadcast plugin.
//!
//! `/broadcast` arms a pending broadcast for the administrator. The next
//! non-command message they send is copied to every subscriber and a
//! summary is sent back. `/cancel` disarms without sending.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use tracing::{debug, error, info, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::bot::messenger::{Delivery, Messenger};
use crate::database::SubscriberStore;
use crate::error::BotError;

pub const DENIED_TEXT: &str = "⛔ You are not authorized to use this command.";
const PROMPT_TEXT: &str = "📝 Send the message you want to broadcast.";

/// An armed broadcast waiting for its content.
#[derive(Debug, Clone, Copy)]
struct PendingBroadcast {
    armed_at: Instant,
}

/// Per-administrator broadcast sessions.
///
/// At most one pending broadcast per admin. Consuming a session removes
/// it in the same map operation as the lookup, so two concurrent messages
/// cannot both start a fan-out.
#[derive(Clone, Default)]
pub struct BroadcastController {
    pending: Arc<DashMap<u64, PendingBroadcast>>,
}

impl BroadcastController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a broadcast for `admin_id`. Re-arming keeps a single session.
    pub fn arm(&self, admin_id: u64) {
        self.pending.insert(
            admin_id,
            PendingBroadcast {
                armed_at: Instant::now(),
            },
        );
    }

    pub fn is_pending(&self, admin_id: u64) -> bool {
        self.pending.contains_key(&admin_id)
    }

    /// Consume the pending session. Returns `false` if there was none.
    pub fn take(&self, admin_id: u64) -> bool {
        match self.pending.remove(&admin_id) {
            Some((_, session)) => {
                debug!(
                    "Broadcast for {} consumed after {:?}",
                    admin_id,
                    session.armed_at.elapsed()
                );
                true
            }
            None => false,
        }
    }
}

/// What gets fanned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastContent {
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    /// Any other kind of message, copied from the admin's chat.
    Copy {
        from_chat: ChatId,
        message_id: MessageId,
    },
}

impl BroadcastContent {
    /// Formatted text is copied so its entities survive.
    pub fn from_message(msg: &Message) -> Self {
        if let Some(text) = msg.text() {
            if msg.entities().is_none_or(|entities| entities.is_empty()) {
                return Self::Text(text.to_owned());
            }
        }

        if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
            return Self::Photo {
                file_id: largest.file.id.to_string(),
                caption: msg.caption().map(str::to_owned),
            };
        }

        Self::Copy {
            from_chat: msg.chat.id,
            message_id: msg.id,
        }
    }

    async fn deliver<M>(&self, messenger: &M, recipient: ChatId) -> Delivery
    where
        M: Messenger + ?Sized,
    {
        let result = match self {
            Self::Text(text) => messenger.send_message(recipient, text, None).await,
            Self::Photo { file_id, caption } => {
                messenger
                    .send_photo(recipient, file_id, caption.as_deref())
                    .await
            }
            Self::Copy {
                from_chat,
                message_id,
            } => messenger.copy_message(recipient, *from_chat, *message_id).await,
        };
        result.into()
    }
}

/// Outcome counters of a fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn summary(&self) -> String {
        format!("sent to {} users, failed: {}", self.sent, self.failed)
    }
}

/// Send `content` to every stored subscriber, in store order.
///
/// A failed recipient is counted and skipped. Only a failure to read the
/// subscriber list aborts.
pub async fn fan_out<M>(
    messenger: &M,
    store: &dyn SubscriberStore,
    content: &BroadcastContent,
) -> Result<DeliveryReport, BotError>
where
    M: Messenger + ?Sized,
{
    let ids = store.list_ids().await?;
    let mut report = DeliveryReport::default();

    for id in ids {
        match content.deliver(messenger, ChatId(id as i64)).await {
            Delivery::Sent => report.sent += 1,
            Delivery::Failed(e) => {
                warn!("Broadcast to {} failed: {}", id, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Phase one: arm the broadcast if `caller` is the administrator.
pub async fn arm_broadcast<M>(
    messenger: &M,
    controller: &BroadcastController,
    admin_id: u64,
    caller: u64,
    chat_id: ChatId,
) -> Result<(), BotError>
where
    M: Messenger + ?Sized,
{
    if caller != admin_id {
        messenger.send_message(chat_id, DENIED_TEXT, None).await?;
        return Err(BotError::Unauthorized(caller));
    }

    controller.arm(caller);
    info!("Broadcast armed by {}", caller);
    messenger.send_message(chat_id, PROMPT_TEXT, None).await?;
    Ok(())
}

/// Phase two: consume the session and fan `content` out.
///
/// Returns `None` when `caller` had nothing pending. The summary is sent
/// back to `chat_id`; a store failure is reported as zero sent.
pub async fn complete_broadcast<M>(
    messenger: &M,
    store: &dyn SubscriberStore,
    controller: &BroadcastController,
    caller: u64,
    chat_id: ChatId,
    content: &BroadcastContent,
) -> Result<Option<DeliveryReport>, BotError>
where
    M: Messenger + ?Sized,
{
    if !controller.take(caller) {
        return Ok(None);
    }

    let report = match fan_out(messenger, store, content).await {
        Ok(report) => report,
        Err(e) => {
            error!("Broadcast aborted: {}", e);
            DeliveryReport::default()
        }
    };

    info!("Broadcast finished: {}", report.summary());
    messenger
        .send_message(chat_id, &report.summary(), None)
        .await?;
    Ok(Some(report))
}

/// Phase zero: drop a pending broadcast without sending.
pub async fn cancel_broadcast<M>(
    messenger: &M,
    controller: &BroadcastController,
    admin_id: u64,
    caller: u64,
    chat_id: ChatId,
) -> Result<bool, BotError>
where
    M: Messenger + ?Sized,
{
    if caller != admin_id {
        messenger.send_message(chat_id, DENIED_TEXT, None).await?;
        return Err(BotError::Unauthorized(caller));
    }

    let cancelled = controller.take(caller);
    let text = if cancelled {
        "❌ Broadcast cancelled."
    } else {
        "ℹ️ No broadcast is pending."
    };
    messenger.send_message(chat_id, text, None).await?;
    Ok(cancelled)
}

/// Handle the /broadcast command.
pub async fn broadcast_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    match arm_broadcast(&bot, &state.broadcast, state.admin_id, user.id.0, msg.chat.id).await {
        Ok(()) => Ok(()),
        Err(BotError::Unauthorized(id)) => {
            debug!("Rejected /broadcast from {}", id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle the /cancel command.
pub async fn cancel_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    match cancel_broadcast(&bot, &state.broadcast, state.admin_id, user.id.0, msg.chat.id).await {
        Ok(_) => Ok(()),
        Err(BotError::Unauthorized(id)) => {
            debug!("Rejected /cancel from {}", id);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Whether this message should be captured as broadcast content.
pub fn is_pending_content(msg: Message, state: AppState) -> bool {
    msg.from.as_ref().is_some_and(|user| {
        user.id.0 == state.admin_id && state.broadcast.is_pending(user.id.0)
    })
}

/// Capture the admin's next message and fan it out.
pub async fn capture_handler(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let content = BroadcastContent::from_message(&msg);
    complete_broadcast(
        &bot,
        state.store.as_ref(),
        &state.broadcast,
        user.id.0,
        msg.chat.id,
        &content,
    )
    .await?;
    Ok(())
}
