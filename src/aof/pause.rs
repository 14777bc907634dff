use tokio::{
    fs::File,
    io::AsyncWriteExt,
    sync::{mpsc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::warn;

use crate::aof::record::CommandRecord;

/// The handles that change when a rewrite starts or finishes.
#[derive(Debug)]
pub struct ActiveLog {
    /// Only the writer task locks this while holding a shared permit, so it is never contended.
    file: Mutex<File>,
    /// Present exactly while a rewrite is running.
    rewrite_buffer: Option<mpsc::UnboundedSender<CommandRecord>>,
}

impl ActiveLog {
    pub fn new(file: File) -> Self {
        Self {
            file: Mutex::new(file),
            rewrite_buffer: None,
        }
    }

    pub fn is_rewriting(&self) -> bool {
        self.rewrite_buffer.is_some()
    }

    /// Mirrors `record` into the rewrite buffer (if any), then writes it to the log.
    ///
    /// Write failures are logged and swallowed; the mirrored copy is kept.
    pub async fn append(&self, record: &CommandRecord) {
        if let Some(buffer) = &self.rewrite_buffer {
            if buffer.send(record.clone()).is_err() {
                warn!("rewrite buffer closed before the rewrite finished");
            }
        }

        let mut file = self.file.lock().await;
        if let Err(err) = file.write_all(&record.encode()).await {
            warn!(error = %err, command = %record.name, "failed to append to AOF");
        }
    }

    pub async fn flush(&self) -> std::io::Result<()> {
        self.file.lock().await.flush().await
    }

    pub async fn sync(&self) -> std::io::Result<()> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_all().await
    }

    pub(crate) fn file_mut(&mut self) -> &mut File {
        self.file.get_mut()
    }

    pub(crate) fn replace_file(&mut self, file: File) -> File {
        std::mem::replace(self.file.get_mut(), file)
    }

    pub(crate) fn install_rewrite_buffer(&mut self) -> mpsc::UnboundedReceiver<CommandRecord> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.rewrite_buffer = Some(sender);
        receiver
    }

    pub(crate) fn remove_rewrite_buffer(&mut self) {
        self.rewrite_buffer = None;
    }
}

/// Read/write lock between appenders and the rewrite engine.
///
/// Appends hold a shared permit for their write-and-mirror step. The rewrite engine
/// takes the exclusive permit twice per cycle: to install the rewrite buffer and to
/// swap in the rewritten file. A permit is released by dropping it.
#[derive(Debug)]
pub struct PauseCoordinator {
    active: RwLock<ActiveLog>,
}

impl PauseCoordinator {
    pub fn new(active: ActiveLog) -> Self {
        Self {
            active: RwLock::new(active),
        }
    }

    pub async fn acquire_append(&self) -> RwLockReadGuard<'_, ActiveLog> {
        self.active.read().await
    }

    pub async fn acquire_exclusive(&self) -> RwLockWriteGuard<'_, ActiveLog> {
        self.active.write().await
    }
}
