//! Outbound Telegram operations used by the handlers.
//!
//! Handlers talk to [`Messenger`] instead of the bot directly so the
//! approval and broadcast flows can be exercised without the Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId};
use teloxide::RequestError;
use url::Url;

use super::dispatcher::ThrottledBot;

/// A single inline URL button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: Url,
}

impl LinkButton {
    pub fn new(label: impl Into<String>, url: Url) -> Self {
        Self {
            label: label.into(),
            url,
        }
    }

    fn keyboard(&self) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
            self.label.clone(),
            self.url.clone(),
        )]])
    }
}

/// Outcome of a best-effort send.
#[derive(Debug)]
pub enum Delivery {
    Sent,
    Failed(RequestError),
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

impl From<Result<(), RequestError>> for Delivery {
    fn from(result: Result<(), RequestError>) -> Self {
        match result {
            Ok(()) => Self::Sent,
            Err(e) => Self::Failed(e),
        }
    }
}

/// The Bot API calls the handlers depend on.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn approve_join_request(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<(), RequestError>;

    async fn send_message(
        &self,
        recipient: ChatId,
        text: &str,
        button: Option<&LinkButton>,
    ) -> Result<(), RequestError>;

    async fn send_photo(
        &self,
        recipient: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), RequestError>;

    async fn copy_message(
        &self,
        recipient: ChatId,
        from_chat: ChatId,
        message_id: MessageId,
    ) -> Result<(), RequestError>;
}

#[async_trait]
impl Messenger for ThrottledBot {
    async fn approve_join_request(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<(), RequestError> {
        self.approve_chat_join_request(chat_id, user_id).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        recipient: ChatId,
        text: &str,
        button: Option<&LinkButton>,
    ) -> Result<(), RequestError> {
        let mut request = Requester::send_message(self, recipient, text);
        if let Some(button) = button {
            request = request.reply_markup(button.keyboard());
        }
        request.await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        recipient: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), RequestError> {
        let mut request =
            Requester::send_photo(self, recipient, InputFile::file_id(file_id.to_owned()));
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        request.await?;
        Ok(())
    }

    async fn copy_message(
        &self,
        recipient: ChatId,
        from_chat: ChatId,
        message_id: MessageId,
    ) -> Result<(), RequestError> {
        Requester::copy_message(self, recipient, from_chat, message_id).await?;
        Ok(())
    }
}
