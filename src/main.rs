use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use civic_relay::bot::{message_handler, register_commands, Controller};
use civic_relay::config::{BotConfig, LogFormat};
use civic_relay::flow::FlowController;
use civic_relay::hierarchy::LocationHierarchy;
use civic_relay::localization::init_localization;
use civic_relay::session_store::InMemorySessionStore;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Plain => subscriber.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    // Initialize logging
    init_tracing(config.log_format);

    info!("Starting Civic Relay Telegram Bot");
    info!(config = ?config, "Configuration loaded");

    init_localization().context("Failed to load localization bundles")?;

    let hierarchy = LocationHierarchy::load(&config.hierarchy_path).with_context(|| {
        format!(
            "Failed to load location hierarchy from {}",
            config.hierarchy_path.display()
        )
    })?;

    let controller: Arc<Controller> = Arc::new(FlowController::new(
        Arc::new(hierarchy),
        InMemorySessionStore::in_memory(),
    ));

    // Initialize the bot
    let bot = Bot::new(config.telegram_token.clone());

    if let Err(e) = register_commands(&bot).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    info!("Bot initialized, starting dispatcher");

    let handler = Update::filter_message().endpoint(message_handler);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller, Arc::new(config)])
        // Sessions are per user, so one user's updates run in order across chats
        .distribution_function(|update: &Update| update.from().map(|user| user.id))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
