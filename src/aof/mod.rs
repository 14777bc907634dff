//! Append-only file persistence.
//!
//! Every mutating command is turned into one or more [`CommandRecord`]s by the
//! dispatcher and handed to [`Aof::append`]. A single writer task drains the bounded
//! append queue into the log file. [`Aof::trigger_rewrite`] compacts the log in the
//! background by replaying it into a scratch store and dumping that store as a
//! minimal command set, while appends keep flowing into the old file and a rewrite
//! buffer. On startup [`Aof::load_into`] replays the log into the live store.

mod loader;
mod pause;
mod policy;
mod record;
mod rewrite;
mod writer;

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use thiserror::Error;
use tokio::{
    fs::OpenOptions,
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{error, info, warn};

use crate::{key_value_store::KeyValueStore, resp::RespError};

pub use loader::{load, LoadStats};
pub use pause::{ActiveLog, PauseCoordinator};
pub use policy::{
    spawn_rewrite_policy, RewritePolicy, DEFAULT_CHECK_INTERVAL, DEFAULT_REWRITE_MIN_SIZE,
    DEFAULT_REWRITE_PERCENTAGE,
};
pub use record::CommandRecord;
pub use rewrite::{temp_rewrite_path, RewriteJob, RewriteState, RewriteSummary};
pub use writer::AofMessage;

pub const DEFAULT_QUEUE_SIZE: usize = 1 << 10;

#[derive(Error, Debug)]
pub enum AofError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Decode(#[from] RespError),
    #[error("record is not an array of bulk strings")]
    NotACommand,
    #[error("append-only file is closed")]
    Closed,
    #[error("a rewrite is already in progress")]
    RewriteInProgress,
    #[error("failed to move rewritten log into {path}: {source}")]
    Rename {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to reopen rewritten log {path}: {source}")]
    Reopen {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AofError {
    /// The log path was replaced but could not be reopened; appends would go nowhere.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AofError::Reopen { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AofConfig {
    pub path: PathBuf,
    pub queue_size: usize,
    pub rewrite_policy: RewritePolicy,
}

impl AofConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            queue_size: DEFAULT_QUEUE_SIZE,
            rewrite_policy: RewritePolicy::disabled(),
        }
    }
}

#[derive(Debug)]
pub struct Aof {
    path: PathBuf,
    sender: mpsc::Sender<AofMessage>,
    pause: Arc<PauseCoordinator>,
    writer: Mutex<Option<JoinHandle<()>>>,
    rewrite_state: watch::Sender<RewriteState>,
    rewrite_task: Mutex<Option<JoinHandle<()>>>,
    /// Log size at open time, then after each completed rewrite.
    base_size: AtomicU64,
    closed: AtomicBool,
}

impl Aof {
    /// Opens (creating if needed) the log in append mode and starts the writer task.
    pub async fn open(config: &AofConfig) -> Result<Self, AofError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;
        let size = file.metadata().await?.len();

        let pause = Arc::new(PauseCoordinator::new(ActiveLog::new(file)));
        let (sender, receiver) = mpsc::channel(config.queue_size.max(1));
        let writer = tokio::spawn(writer::run_writer(receiver, Arc::clone(&pause)));
        let (rewrite_state, _) = watch::channel(RewriteState::Idle);

        info!(path = %config.path.display(), size, "opened append-only file");

        Ok(Self {
            path: config.path.clone(),
            sender,
            pause,
            writer: Mutex::new(Some(writer)),
            rewrite_state,
            rewrite_task: Mutex::new(None),
            base_size: AtomicU64::new(size),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_size(&self) -> u64 {
        self.base_size.load(Ordering::Acquire)
    }

    pub async fn current_size(&self) -> Result<u64, AofError> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn state(&self) -> RewriteState {
        *self.rewrite_state.borrow()
    }

    /// Replays the log, as it was when opened, into `store`.
    ///
    /// An incomplete final record is cut off the file so later appends start on a
    /// record boundary. Must run before the first append.
    pub async fn load_into(&self, store: &mut KeyValueStore) -> Result<LoadStats, AofError> {
        let stats = load(store, &self.path, Some(self.base_size())).await?;

        if stats.truncated_bytes > 0 {
            let valid_len = self
                .base_size()
                .saturating_sub(stats.truncated_bytes as u64);
            let file = OpenOptions::new().write(true).open(&self.path).await?;
            file.set_len(valid_len).await?;
            self.base_size.store(valid_len, Ordering::Release);
            warn!(
                path = %self.path.display(),
                valid_len,
                removed = stats.truncated_bytes,
                "truncated incomplete record at the end of the append-only file"
            );
        }

        Ok(stats)
    }

    /// Queues `record` for the writer task. Waits only while the queue is full.
    pub async fn append(&self, record: CommandRecord) -> Result<(), AofError> {
        if self.is_closed() {
            return Err(AofError::Closed);
        }

        self.sender
            .send(AofMessage::Append(record))
            .await
            .map_err(|_| AofError::Closed)
    }

    /// Resolves once every record appended before this call has been written.
    pub async fn flush(&self) -> Result<(), AofError> {
        let (done, wait) = oneshot::channel();
        self.sender
            .send(AofMessage::Flush(done))
            .await
            .map_err(|_| AofError::Closed)?;
        wait.await.map_err(|_| AofError::Closed)
    }

    /// Starts a background rewrite unless one is already running.
    pub fn trigger_rewrite(self: &Arc<Self>) {
        if self.is_closed() {
            warn!("rewrite requested after the append-only file was closed");
            return;
        }

        if self.state() != RewriteState::Idle {
            info!("rewrite already in progress, trigger ignored");
            return;
        }

        let aof = Arc::clone(self);
        let task = tokio::spawn(async move {
            match aof.rewrite().await {
                Ok(summary) => info!(
                    snapshot_len = summary.snapshot_len,
                    dumped = summary.dumped_records,
                    drained = summary.drained_records,
                    new_size = summary.new_size,
                    "background AOF rewrite finished"
                ),
                Err(AofError::RewriteInProgress) => {
                    info!("rewrite already in progress, trigger ignored")
                }
                Err(err) if err.is_fatal() => {
                    error!(error = %err, "append-only file detached after rewrite, aborting");
                    std::process::abort();
                }
                Err(err) => warn!(error = %err, "background AOF rewrite aborted"),
            }
        });

        if let Ok(mut slot) = self.rewrite_task.lock() {
            *slot = Some(task);
        }
    }

    /// Runs every rewrite phase to completion.
    pub async fn rewrite(&self) -> Result<RewriteSummary, AofError> {
        let job = self.begin_rewrite().await?;
        let job = self.write_snapshot(job).await?;
        self.finish_rewrite(job).await
    }

    /// Waits until no rewrite is running.
    pub async fn wait_for_rewrite(&self) {
        let task = self.rewrite_task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            let _ = task.await;
        }

        let mut state = self.rewrite_state.subscribe();
        let _ = state.wait_for(|state| *state == RewriteState::Idle).await;
    }

    /// Lets any running rewrite finish, then drains the append queue and stops the writer.
    pub async fn shutdown(&self) -> Result<(), AofError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.wait_for_rewrite().await;

        let (done, wait) = oneshot::channel();
        if self.sender.send(AofMessage::Shutdown(done)).await.is_ok() {
            let _ = wait.await;
        }

        let writer = self.writer.lock().ok().and_then(|mut slot| slot.take());
        if let Some(writer) = writer {
            let _ = writer.await;
        }

        info!(path = %self.path.display(), "append-only file closed");
        Ok(())
    }

    fn set_state(&self, state: RewriteState) {
        self.rewrite_state.send_replace(state);
    }

    /// Moves from `Idle` to `Starting`; fails if a rewrite already owns the engine.
    fn claim_rewrite(&self) -> Result<(), AofError> {
        if self.is_closed() {
            return Err(AofError::Closed);
        }

        let claimed = self.rewrite_state.send_if_modified(|state| {
            if *state == RewriteState::Idle {
                *state = RewriteState::Starting;
                true
            } else {
                false
            }
        });

        if claimed {
            Ok(())
        } else {
            Err(AofError::RewriteInProgress)
        }
    }
}
