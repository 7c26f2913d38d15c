//! Invevent Bot - Telegram bot for organizing and discovering events
//!
//! This crate wires the core wizard and visibility rules to Telegram and
//! SQLite.

pub mod commands;
pub mod config;
pub mod conversation;
pub mod db;
pub mod geocode;
pub mod handlers;
pub mod menus;
pub mod render;
pub mod session;
pub mod sweeper;

use anyhow::Result;
use config::Config;
use db::BotDb;
use geocode::Geocoder;
use invevent_core::wizard::Wizard;
use session::WizardSessions;
use sqlx::SqlitePool;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;

/// Everything the handlers need, injected into the dispatcher
#[derive(Clone)]
pub struct AppState {
    pub db: BotDb,
    pub sessions: WizardSessions,
    pub wizard: Wizard,
    pub geocoder: Geocoder,
    pub bot_username: String,
    pub nearby_radius_km: f64,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Result<Self> {
        Ok(Self {
            db: BotDb::new(pool),
            sessions: WizardSessions::new(config.wizard_idle_ttl),
            wizard: Wizard::new(config.wizard_flow()),
            geocoder: Geocoder::new(config.geocoder_url.clone(), config.geocoder_timeout)?,
            bot_username: config.bot_username.clone(),
            nearby_radius_km: config.nearby_radius_km,
        })
    }
}

/// Run the Telegram bot service
///
/// Runs the dispatcher and the event sweeper until `shutdown` is cancelled.
/// Signal handling is left to the caller.
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `config` - Bot configuration
/// * `shutdown` - Cancellation token for graceful shutdown
pub async fn run_bot(pool: SqlitePool, config: Config, shutdown: CancellationToken) -> Result<()> {
    let state = AppState::new(pool, &config)?;

    let sweeper = tokio::spawn(sweeper::run(
        state.db.clone(),
        config.event_sweep_interval,
        shutdown.clone(),
    ));

    let bot = Bot::new(&config.core.telegram_bot_token);
    tracing::info!(
        "Bot initialized as @{} ({:?} wizard), starting dispatcher",
        config.bot_username,
        config.wizard_flow().steps()
    );

    // Note: NOT using enable_ctrlc_handler() - shutdown is managed by the caller
    let mut dispatcher = Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![state])
        .build();

    let dispatcher_token = dispatcher.shutdown_token();
    let watcher = shutdown.clone();
    tokio::spawn(async move {
        watcher.cancelled().await;
        if let Ok(stopped) = dispatcher_token.shutdown() {
            stopped.await;
        }
    });

    dispatcher.dispatch().await;
    tracing::info!("Dispatcher stopped");

    shutdown.cancel();
    sweeper.await?;
    Ok(())
}
