use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::aof::{pause::PauseCoordinator, record::CommandRecord};

/// Messages accepted by the writer task, processed strictly in arrival order.
#[derive(Debug)]
pub enum AofMessage {
    Append(CommandRecord),
    /// Resolves once every earlier message has reached the operating system.
    Flush(oneshot::Sender<()>),
    /// Writes everything queued before it, fsyncs and stops the task.
    Shutdown(oneshot::Sender<()>),
}

/// Drains the append queue into the active log, one write per record.
pub async fn run_writer(mut receiver: mpsc::Receiver<AofMessage>, pause: Arc<PauseCoordinator>) {
    debug!("AOF writer started");

    while let Some(message) = receiver.recv().await {
        match message {
            AofMessage::Append(record) => {
                let active = pause.acquire_append().await;
                active.append(&record).await;
            }
            AofMessage::Flush(done) => {
                let active = pause.acquire_append().await;
                if let Err(err) = active.flush().await {
                    warn!(error = %err, "failed to flush AOF");
                }
                let _ = done.send(());
            }
            AofMessage::Shutdown(done) => {
                let active = pause.acquire_append().await;
                if let Err(err) = active.sync().await {
                    warn!(error = %err, "failed to fsync AOF on shutdown");
                }
                drop(active);
                let _ = done.send(());
                break;
            }
        }
    }

    receiver.close();
    info!("AOF writer stopped");
}
