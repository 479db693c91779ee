pub mod context;
mod gateway_bridge;
pub mod lifecycle;

use coinbot_infrastructure::AppConfig;

pub use context::AppContext;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let context = AppContext::from_config(config).await?;
    lifecycle::run(context).await
}
