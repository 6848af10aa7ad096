//! Message dispatcher setup.
//!
//! Builds the dispatcher with all command handlers and event handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use tracing::debug;
use url::Url;

use crate::database::SubscriberStore;
use crate::events;
use crate::plugins::{self, broadcast::BroadcastController};

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// The dispatcher type shared by the polling and webhook runners.
pub type BotDispatcher = Dispatcher<ThrottledBot, anyhow::Error, DefaultKey>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Subscriber persistence (MongoDB or JSON file).
    pub store: Arc<dyn SubscriberStore>,

    /// Pending broadcast sessions.
    pub broadcast: BroadcastController,

    /// The administrator allowed to broadcast and read stats.
    pub admin_id: u64,

    /// Target of the welcome message button.
    pub welcome_link: Url,
}

impl AppState {
    pub fn new(store: Arc<dyn SubscriberStore>, admin_id: u64, welcome_link: Url) -> Self {
        Self {
            store,
            broadcast: BroadcastController::new(),
            admin_id,
            welcome_link,
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(bot: ThrottledBot, state: AppState) -> BotDispatcher {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    // Commands first, so a command is never captured as broadcast content
    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(plugins::broadcast_capture_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(events::event_handler())
}
