#![forbid(unsafe_code)]

use clap::Parser;
use roadmap_server::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    tracing::info!(
        "starting roadmap server on {} (storage: {})",
        config.bind_addr(),
        config.storage_dir.display()
    );

    roadmap_server::serve(config).await?;

    Ok(())
}
