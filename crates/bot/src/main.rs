use anyhow::Result;
use bot::config::Config;
use invevent_shared::bootstrap;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_env();

    // The guard must be kept alive for the duration of the program to ensure logs are flushed
    let _guard = bootstrap::init_tracing("bot");

    tracing::info!("🚀 Starting Invevent Telegram bot");

    let config = Config::from_env()?;
    tracing::info!("✓ Configuration loaded");

    let pool = bootstrap::init_db(&config.core).await?;
    bootstrap::run_migrations(&pool).await?;

    let shutdown = CancellationToken::new();
    let bot_handle = tokio::spawn(bot::run_bot(pool, config, shutdown.clone()));

    wait_for_shutdown().await;
    tracing::info!("📡 Shutdown signal received");
    shutdown.cancel();

    bot_handle.await??;
    tracing::info!("✓ Bot stopped gracefully");
    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
