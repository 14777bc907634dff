use anyhow::Context;
use tracing_subscriber::EnvFilter;

use redis_aof::{
    config::{CliError, ServerConfig},
    server::RedisServer,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match ServerConfig::new(std::env::args()) {
        Ok(config) => config,
        Err(CliError::InvalidArguments(err)) => err.exit(),
    };
    let server = RedisServer::open(config)
        .await
        .context("failed to start server")?;
    let listener = server.bind().await.context("failed to bind listener")?;

    server
        .run(listener, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await?;

    Ok(())
}
