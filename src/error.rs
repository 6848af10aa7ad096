//! Error types.
//!
//! Fatal failures are errors. Best-effort deliveries (welcome messages,
//! broadcast recipients) are reported as values instead, see
//! [`crate::bot::messenger::Delivery`].

use teloxide::RequestError;
use thiserror::Error;

/// Invalid or missing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Subscriber store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handler-level failure.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("user {0} is not the configured administrator")]
    Unauthorized(u64),

    #[error("join request approval failed: {0}")]
    Approval(#[source] RequestError),

    #[error("subscriber store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Telegram request failed: {0}")]
    Transport(#[from] RequestError),
}

pub type StoreResult<T> = Result<T, StoreError>;
