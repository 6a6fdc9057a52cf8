use anyhow::{Context, Result};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    tracing::info!("loading configuration from: {config_path}");

    let settings = frost_coordinator::CoordinatorSettings::load(&config_path)
        .with_context(|| format!("failed to load coordinator config from {config_path}"))?;

    frost_coordinator::run(settings).await
}
