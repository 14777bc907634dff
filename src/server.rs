use std::{future::Future, net::SocketAddr, sync::Arc};

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{aof::AofError, config::ServerConfig, connection::handle_client_connection, database::Database};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to restore the append-only file: {0}")]
    Aof(#[from] AofError),
    #[error("network error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct RedisServer {
    pub config: ServerConfig,
    database: Arc<Database>,
}

impl RedisServer {
    /// Restores the database from the append-only file, if enabled. No client is
    /// served until this returns.
    pub async fn open(config: ServerConfig) -> Result<Self, ServerError> {
        let database = Database::open(config.clone()).await?;

        Ok(Self {
            config,
            database: Arc::new(database),
        })
    }

    pub fn database(&self) -> Arc<Database> {
        Arc::clone(&self.database)
    }

    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = SocketAddr::from(([127, 0, 0, 1], self.config.port));
        Ok(TcpListener::bind(address).await?)
    }

    /// Accepts clients on `listener` until `shutdown` resolves, then closes the
    /// append-only file after draining every queued record.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        info!(address = %listener.local_addr()?, "accepting connections");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, address)) => {
                        let database = Arc::clone(&self.database);
                        tokio::spawn(async move {
                            handle_client_connection(stream, database, address.to_string()).await;
                        });
                    }
                    Err(err) => warn!(error = %err, "failed to accept connection"),
                },
                _ = &mut shutdown => break,
            }
        }

        info!("shutting down");
        self.database.shutdown().await;

        Ok(())
    }
}
