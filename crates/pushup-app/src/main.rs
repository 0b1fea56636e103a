use anyhow::Result;
use tracing::{error, info};

use pushup_app::presentation::{bootstrap, poller};
use pushup_infrastructure::config::Settings;
use pushup_infrastructure::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;

    match logging::init_logger(settings.log_dir.clone(), settings.log_mode, settings.log_level) {
        Ok(()) => {
            info!("Pushup bot starting...");
            if let Some(log_dir) = logging::get_log_dir() {
                info!("File logging initialized at: {}", log_dir.display());
            }
        }
        Err(e) => {
            eprintln!("Failed to initialize file logging: {}", e);
            eprintln!("   Falling back to console logging only");

            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_target(true)
                .try_init();
        }
    }

    let runtime = bootstrap::build_runtime(&settings).await?;
    runtime.scheduler.start().await;

    poller::run_polling(
        runtime.telegram.as_ref(),
        &runtime.service,
        runtime.poll_backoff,
        shutdown_signal(),
    )
    .await;

    runtime.scheduler.shutdown().await;
    info!("Pushup bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
