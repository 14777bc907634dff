use std::path::{Path, PathBuf};

use bytes::Bytes;
use jiff::Timestamp;
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc,
};
use tracing::{debug, error, info, warn};

use crate::{
    aof::{loader::load, record::CommandRecord, Aof, AofError},
    key_value_store::{DataType, KeyValueStore},
};

/// List elements per `RPUSH` when dumping a list.
pub const LIST_CHUNK_SIZE: usize = 64;

/// Phase of the rewrite engine, published to observers through a watch channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RewriteState {
    #[default]
    Idle,
    /// Claimed; waiting for the exclusive permit to install the rewrite buffer.
    Starting,
    /// Rebuilding a scratch store from the log prefix captured at start.
    Replaying,
    /// Writing the scratch store into the temporary file.
    Dumping,
    /// Appends are paused while the buffer is drained and the file swapped.
    Finishing,
}

/// A rewrite in progress, owned by whoever drives it through its phases.
#[derive(Debug)]
pub struct RewriteJob {
    temp_path: PathBuf,
    temp_file: File,
    snapshot_len: u64,
    buffer: mpsc::UnboundedReceiver<CommandRecord>,
    dumped_records: usize,
}

impl RewriteJob {
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteSummary {
    pub snapshot_len: u64,
    pub dumped_records: usize,
    pub drained_records: usize,
    pub new_size: u64,
}

/// `temp-rewrite-<pid>.aof` beside the log, so the final rename stays on one filesystem.
pub fn temp_rewrite_path(log_path: &Path) -> PathBuf {
    log_path.with_file_name(format!("temp-rewrite-{}.aof", std::process::id()))
}

/// The minimal command sequence that rebuilds `store` as of `now`.
///
/// Keys already expired at `now` are left out. Expirations follow the data as
/// `PEXPIREAT` records so a replay reaches the same absolute deadlines.
pub fn snapshot_records(store: &KeyValueStore, now: Timestamp) -> Vec<CommandRecord> {
    let mut live = Vec::new();
    store.for_each_key(|key, value| {
        if !value.is_expired_at(now) {
            live.push((key.clone(), value.clone()));
        }
        true
    });
    live.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut records = Vec::with_capacity(live.len());
    for (key, value) in &live {
        match &value.data {
            DataType::String(s) => {
                records.push(CommandRecord::new("SET", [key.clone(), s.clone()]))
            }
            DataType::Array(items) => {
                let items: Vec<&Bytes> = items.iter().collect();
                for chunk in items.chunks(LIST_CHUNK_SIZE) {
                    let mut arguments = Vec::with_capacity(chunk.len() + 1);
                    arguments.push(key.clone());
                    arguments.extend(chunk.iter().map(|&item| item.clone()));
                    records.push(CommandRecord::new("RPUSH", arguments));
                }
            }
        }
    }

    for (key, value) in &live {
        if let Some(expiration) = value.expiration {
            records.push(CommandRecord::pexpireat(key.clone(), expiration));
        }
    }

    records
}

impl Aof {
    /// Claims the engine, captures the current log length and starts mirroring appends.
    pub async fn begin_rewrite(&self) -> Result<RewriteJob, AofError> {
        self.claim_rewrite()?;

        match self.prepare_rewrite().await {
            Ok(job) => {
                info!(
                    snapshot_len = job.snapshot_len,
                    temp = %job.temp_path.display(),
                    "AOF rewrite started"
                );
                Ok(job)
            }
            Err(err) => {
                self.set_state(RewriteState::Idle);
                Err(err)
            }
        }
    }

    async fn prepare_rewrite(&self) -> Result<RewriteJob, AofError> {
        let temp_path = temp_rewrite_path(&self.path);
        let mut active = self.pause.acquire_exclusive().await;

        let file = active.file_mut();
        file.flush().await?;
        file.sync_all().await?;
        let snapshot_len = file.metadata().await?.len();

        let temp_file = File::create(&temp_path).await?;
        let buffer = active.install_rewrite_buffer();

        Ok(RewriteJob {
            temp_path,
            temp_file,
            snapshot_len,
            buffer,
            dumped_records: 0,
        })
    }

    /// Rebuilds the captured prefix in a scratch store and dumps it into the temp file.
    pub async fn write_snapshot(&self, mut job: RewriteJob) -> Result<RewriteJob, AofError> {
        match self.dump_snapshot(&mut job).await {
            Ok(()) => Ok(job),
            Err(err) => {
                self.abort_rewrite(job).await;
                Err(err)
            }
        }
    }

    async fn dump_snapshot(&self, job: &mut RewriteJob) -> Result<(), AofError> {
        self.set_state(RewriteState::Replaying);
        let mut scratch = KeyValueStore::for_replay();
        load(&mut scratch, &self.path, Some(job.snapshot_len)).await?;

        self.set_state(RewriteState::Dumping);
        let records = snapshot_records(&scratch, Timestamp::now());
        {
            let mut writer = BufWriter::new(&mut job.temp_file);
            for record in &records {
                writer.write_all(&record.encode()).await?;
            }
            writer.flush().await?;
        }
        job.temp_file.sync_all().await?;
        job.dumped_records = records.len();

        debug!(
            keys = scratch.len(),
            records = job.dumped_records,
            "AOF snapshot written"
        );
        Ok(())
    }

    /// Pauses appends, drains the rewrite buffer into the temp file and swaps it in.
    ///
    /// The rename happens while the old handle is still open, so a failed rename leaves
    /// the old log intact and in use. A failed reopen after a successful rename is fatal.
    pub async fn finish_rewrite(&self, job: RewriteJob) -> Result<RewriteSummary, AofError> {
        self.set_state(RewriteState::Finishing);

        let RewriteJob {
            temp_path,
            mut temp_file,
            snapshot_len,
            mut buffer,
            dumped_records,
        } = job;

        let mut active = self.pause.acquire_exclusive().await;

        let drained = match drain_buffer(&mut buffer, &mut temp_file).await {
            Ok(drained) => drained,
            Err(err) => {
                active.remove_rewrite_buffer();
                drop(active);
                discard_temp_file(&temp_path).await;
                self.set_state(RewriteState::Idle);
                return Err(err.into());
            }
        };

        if let Err(err) = active.file_mut().flush().await {
            warn!(error = %err, "failed to flush AOF before swapping it");
        }

        if let Err(source) = tokio::fs::rename(&temp_path, &self.path).await {
            active.remove_rewrite_buffer();
            drop(active);
            discard_temp_file(&temp_path).await;
            self.set_state(RewriteState::Idle);
            return Err(AofError::Rename {
                path: self.path.clone(),
                source,
            });
        }

        let reopened = OpenOptions::new().append(true).open(&self.path).await;
        let file = match reopened {
            Ok(file) => file,
            Err(source) => {
                active.remove_rewrite_buffer();
                drop(active);
                self.set_state(RewriteState::Idle);
                error!(path = %self.path.display(), error = %source, "failed to reopen rewritten AOF");
                return Err(AofError::Reopen {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let new_size = match file.metadata().await {
            Ok(metadata) => metadata.len(),
            Err(_) => 0,
        };
        let old = active.replace_file(file);
        active.remove_rewrite_buffer();
        drop(active);
        drop(old);

        self.base_size.store(new_size, std::sync::atomic::Ordering::Release);
        self.set_state(RewriteState::Idle);

        Ok(RewriteSummary {
            snapshot_len,
            dumped_records,
            drained_records: drained,
            new_size,
        })
    }

    /// Stops mirroring, removes the temp file and returns the engine to `Idle`.
    pub async fn abort_rewrite(&self, job: RewriteJob) {
        self.pause.acquire_exclusive().await.remove_rewrite_buffer();
        drop(job.temp_file);
        discard_temp_file(&job.temp_path).await;
        self.set_state(RewriteState::Idle);
        warn!("AOF rewrite aborted");
    }
}

async fn drain_buffer(
    buffer: &mut mpsc::UnboundedReceiver<CommandRecord>,
    file: &mut File,
) -> std::io::Result<usize> {
    let mut drained = 0;
    {
        let mut writer = BufWriter::new(&mut *file);
        while let Ok(record) = buffer.try_recv() {
            writer.write_all(&record.encode()).await?;
            drained += 1;
        }
        writer.flush().await?;
    }
    file.sync_all().await?;

    Ok(drained)
}

async fn discard_temp_file(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove temporary rewrite file");
        }
    }
}
