//! # Main Entry Point
//!
//! Initializes the gate using the layered architecture:
//! - Domain: Configuration, Types, Traits
//! - Infrastructure: Telegram, Storage, Translations, Link shortening
//! - Application: Payload parsing, Router, StartGate, Retry, Logging
//! - Interface: Flow handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teloxide::prelude::*;

use crate::application::gate::{Collaborators, StartGate};
use crate::application::grants::MemoryGrantStore;
use crate::application::retry::RetryPolicy;
use crate::application::utils::SystemClock;
use crate::domain::config::{AppConfig, GatePolicy, StorageBackend};
use crate::domain::traits::{GrantStore, LinkShortener, Transport, Translator, UserRegistry};
use crate::infrastructure::content::StorageChatResolver;
use crate::infrastructure::i18n::LocaleTranslator;
use crate::infrastructure::membership::TelegramMembershipGuard;
use crate::infrastructure::password::TelegramPasswordUnlocker;
use crate::infrastructure::shortener::{HttpLinkShortener, PassthroughShortener};
use crate::infrastructure::storage::FileUserRegistry;
use crate::infrastructure::telegram::{TelegramTransport, inbound_event};
use crate::strings::logs;

#[derive(Parser, Debug)]
#[command(name = "start-gate", version, about = "Access gate for a Telegram file bot's /start links")]
struct Cli {
    /// Path to config.yaml (defaults to data/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

type Storage = (Option<Arc<dyn UserRegistry>>, Arc<dyn GrantStore>);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load Configuration
    let config_path = AppConfig::locate(cli.config);
    let config = AppConfig::load(&config_path)?;

    // 2. Logging Setup
    let _log_guard = application::logging::init(&config.logging)?;
    tracing::info!("{}", logs::config_loaded(&config_path.display().to_string()));

    // 3. Telegram identity
    let bot = Bot::new(&config.telegram.token);
    let me = bot
        .get_me()
        .await
        .context("Failed to reach the Telegram Bot API")?;
    let username = config
        .telegram
        .username
        .clone()
        .or_else(|| me.user.username.clone())
        .context("Bot has no public username; set telegram.username")?;
    let bot_id = me.user.id;
    tracing::info!("{}", logs::logged_in(&username));

    let policy = config.policy(username);

    // 4. Infrastructure
    let telegram = Arc::new(TelegramTransport::new(bot.clone()));
    let transport: Arc<dyn Transport> = telegram.clone();

    let locales = LocaleTranslator::load(
        Path::new(&config.i18n.locales_dir),
        &config.i18n.default_language,
    )?;
    tracing::info!("{}", logs::locales_loaded(locales.len(), &config.i18n.locales_dir));
    let translator: Arc<dyn Translator> = Arc::new(locales);

    let (registry, grants) = build_storage(&config, &policy).await?;

    let shortener: Arc<dyn LinkShortener> = match &config.token.shortener {
        Some(shortener) => Arc::new(HttpLinkShortener::new(shortener)),
        None => Arc::new(PassthroughShortener),
    };

    let membership = TelegramMembershipGuard::new(
        &config.channel,
        Arc::new(policy.clone()),
        telegram.clone(),
        transport.clone(),
        translator.clone(),
    );

    // 5. Gate
    let deps = Collaborators {
        transport: transport.clone(),
        registry,
        grants,
        membership: Arc::new(membership),
        translator: translator.clone(),
        shortener,
        resolver: Arc::new(StorageChatResolver::new(config.channel.storage_chat)),
        password: Arc::new(TelegramPasswordUnlocker::new(transport, translator)),
        allow_list: Arc::new(config.allow_list()),
        clock: Arc::new(SystemClock),
    };
    let gate = StartGate::new(policy, deps, RetryPolicy::from_config(&config.retry));

    // 6. Dispatcher
    // Each event runs in its own task so a rate-limit wait never holds up other chats.
    let handler = Update::filter_message().endpoint(move |msg: Message, gate: StartGate| async move {
        if let Some(event) = inbound_event(&msg, bot_id) {
            tokio::spawn(async move {
                gate.handle(event).await;
            });
        }
        respond(())
    });

    tracing::info!("{}", logs::DISPATCHER_START);
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![gate])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    tracing::info!("{}", logs::SHUTDOWN);
    Ok(())
}

async fn build_storage(config: &AppConfig, policy: &GatePolicy) -> Result<Storage> {
    let window = policy.token_window_ms();
    match config.storage.backend {
        None => {
            tracing::info!("{}", logs::STORAGE_DISABLED);
            let grants: Arc<dyn GrantStore> = Arc::new(MemoryGrantStore::new(window));
            Ok((None, grants))
        }
        Some(StorageBackend::File) => {
            let registry = FileUserRegistry::load(&config.storage.path)
                .context("Failed to open user registry")?;
            tracing::info!("{}", logs::storage_enabled(&format!("file ({})", config.storage.path)));
            let registry: Arc<dyn UserRegistry> = Arc::new(registry);
            let grants: Arc<dyn GrantStore> = Arc::new(MemoryGrantStore::new(window));
            Ok((Some(registry), grants))
        }
        Some(StorageBackend::Redis) => build_redis(config, window).await,
    }
}

#[cfg(feature = "redis")]
async fn build_redis(config: &AppConfig, window: Option<i64>) -> Result<Storage> {
    use crate::infrastructure::storage::redis::{RedisGrantStore, RedisUserRegistry, connect};

    let url = config
        .storage
        .redis_url
        .as_deref()
        .context("storage.redis_url is required for the redis backend")?;
    let conn = connect(url).await.context("Failed to connect to redis")?;
    tracing::info!("{}", logs::storage_enabled("redis"));

    let prefix = config.storage.key_prefix.as_str();
    let registry: Arc<dyn UserRegistry> = Arc::new(RedisUserRegistry::new(conn.clone(), prefix));
    let grants: Arc<dyn GrantStore> = Arc::new(RedisGrantStore::new(conn, prefix, window));
    Ok((Some(registry), grants))
}

#[cfg(not(feature = "redis"))]
async fn build_redis(_config: &AppConfig, _window: Option<i64>) -> Result<Storage> {
    anyhow::bail!("storage.backend = redis needs a build with `--features redis`")
}
