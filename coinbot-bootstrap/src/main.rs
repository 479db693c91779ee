use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use coinbot_application::TRANSACTIONS_TARGET;
use coinbot_infrastructure::{AppConfig, CONFIG_PATH_ENV};

#[derive(Parser, Debug)]
#[command(name = "coinbot")]
#[command(about = "Coin bot economy server", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

/// Console output filtered by `RUST_LOG`, plus the transactions log file
/// holding one bare line per ledger movement.
fn init_tracing(transactions_log_path: &str) -> Result<WorkerGuard> {
    let path = Path::new(transactions_log_path);
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("transactions_log_path has no file name"))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    let console = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    let transactions = fmt::layer()
        .with_writer(writer)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_ansi(false)
        .with_filter(Targets::new().with_target(TRANSACTIONS_TARGET, Level::INFO));

    tracing_subscriber::registry()
        .with(console)
        .with(transactions)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_PATH_ENV, config);
    }

    let config = AppConfig::load().await?;
    let _guard = init_tracing(&config.transactions_log_path)?;

    coinbot_bootstrap::run(config).await
}
