//! Gatekeeper - Join request approval and broadcast bot.
//!
//! Approves chat join requests, welcomes each new member privately and
//! lets the administrator broadcast a message to everyone enrolled.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Subscriber store (MongoDB or JSON file)
//! - `cache` - Moka cache of known subscribers
//! - `bot` - Dispatcher, polling/webhook runtime, outbound messenger
//! - `plugins` - Command handlers
//! - `events` - Join request handler
//! - `error` - Error types

mod bot;
mod cache;
mod config;
mod database;
mod error;
mod events;
mod plugins;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::dispatcher::AppState;
use config::{Config, StorageBackend};
use database::{Database, JsonSubscriberStore, MongoSubscriberStore, SubscriberStore};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gatekeeper=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Gatekeeper bot...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);
    info!("Administrator: {}", config.admin_id);

    let store = open_store(&config.storage).await?;
    info!("Subscriber store ready with {} subscribers", store.count().await?);

    // Throttle keeps broadcasts within Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    let state = AppState::new(store, config.admin_id, config.welcome_link.clone());
    let dispatcher = bot::build_dispatcher(bot.clone(), state);

    bot::run(&config, bot, dispatcher).await
}

/// Open the configured subscriber store.
async fn open_store(storage: &StorageBackend) -> anyhow::Result<Arc<dyn SubscriberStore>> {
    match storage {
        StorageBackend::Mongo { uri, database } => {
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, database).await?;
            info!("Database connected");
            Ok(Arc::new(MongoSubscriberStore::open(&db).await?))
        }
        StorageBackend::Json { path } => {
            info!("Using JSON subscriber file {}", path.display());
            Ok(Arc::new(JsonSubscriberStore::open(path.clone()).await?))
        }
    }
}
