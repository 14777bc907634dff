use std::path::Path;

use bytes::{Buf, BytesMut};
use tokio::{
    fs::File,
    io::{AsyncReadExt, BufReader},
};
use tracing::{debug, error, info, warn};

use crate::{
    aof::{record::CommandRecord, AofError},
    commands::{CommandError, CommandHandler},
    key_value_store::KeyValueStore,
};

const READ_CHUNK_SIZE: usize = 4096;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Records decoded from the log.
    pub records: usize,
    /// Records that executed successfully.
    pub applied: usize,
    /// Records with an unknown command name.
    pub unknown: usize,
    /// Malformed frames and records rejected by their command.
    pub skipped: usize,
    /// Bytes of an incomplete final record, left behind by an interrupted append.
    pub truncated_bytes: usize,
}

/// Replays the log at `path` into `store`, reading at most `max_bytes` bytes.
///
/// A missing file is an empty log. Each record runs through the same command table
/// as live traffic; unknown commands and records that fail to decode or execute are
/// logged and skipped. An incomplete trailing record marks the end of the valid log.
/// The store is in replay mode for the duration, so keys are not expired while loading.
pub async fn load(
    store: &mut KeyValueStore,
    path: &Path,
    max_bytes: Option<u64>,
) -> Result<LoadStats, AofError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no append-only file to load");
            return Ok(LoadStats::default());
        }
        Err(err) => return Err(err.into()),
    };

    let was_replaying = store.is_replaying();
    store.set_replaying(true);
    let result = replay_stream(store, file.take(max_bytes.unwrap_or(u64::MAX))).await;
    store.set_replaying(was_replaying);

    let stats = result?;
    info!(
        path = %path.display(),
        records = stats.records,
        applied = stats.applied,
        unknown = stats.unknown,
        skipped = stats.skipped,
        "loaded append-only file"
    );

    Ok(stats)
}

async fn replay_stream<R>(store: &mut KeyValueStore, reader: R) -> Result<LoadStats, AofError>
where
    R: AsyncReadExt + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let mut stats = LoadStats::default();
    let mut end_of_file = false;
    let mut resyncing = false;
    // Set while consecutive entries fail to decode, so one corrupt stretch counts once.
    let mut corrupt_run = false;

    loop {
        if resyncing {
            resyncing = !skip_to_next_record(&mut buffer);
            if resyncing {
                if end_of_file {
                    break;
                }
                end_of_file = reader.read_buf(&mut buffer).await? == 0;
                continue;
            }
        }

        match CommandRecord::decode(&mut buffer) {
            Ok(Some(record)) => {
                corrupt_run = false;
                stats.records += 1;
                replay_record(store, record, &mut stats);
            }
            Ok(None) if !end_of_file => {
                end_of_file = reader.read_buf(&mut buffer).await? == 0;
            }
            Ok(None) if buffer.is_empty() => break,
            Ok(None) if has_later_record(&buffer) => {
                // Records follow it, so this is corruption rather than a cut-off tail.
                error!(
                    bytes = buffer.len(),
                    "append-only file entry never completes, skipping to the next record"
                );
                if !corrupt_run {
                    stats.skipped += 1;
                }
                corrupt_run = true;
                resyncing = true;
            }
            Ok(None) => {
                warn!(
                    bytes = buffer.len(),
                    "ignoring incomplete record at the end of the append-only file"
                );
                stats.truncated_bytes = buffer.len();
                break;
            }
            Err(AofError::NotACommand) => {
                error!("append-only file entry is not a command, skipping");
                if !corrupt_run {
                    stats.skipped += 1;
                }
            }
            Err(err) => {
                error!(error = %err, "malformed append-only file entry, skipping");
                if !corrupt_run {
                    stats.skipped += 1;
                }
                corrupt_run = true;
                resyncing = true;
            }
        }
    }

    Ok(stats)
}

fn replay_record(store: &mut KeyValueStore, record: CommandRecord, stats: &mut LoadStats) {
    let handler = match CommandHandler::from_record(record) {
        Ok(handler) => handler,
        Err(CommandError::UnknownCommand(name)) => {
            debug!(command = %name, "skipping unknown command in append-only file");
            stats.unknown += 1;
            return;
        }
        Err(err) => {
            warn!(error = %err, "skipping invalid command in append-only file");
            stats.skipped += 1;
            return;
        }
    };

    match handler.execute(store) {
        Ok(_) => stats.applied += 1,
        Err(err) => {
            warn!(command = %handler.name, error = %err, "failed to replay command");
            stats.skipped += 1;
        }
    }
}

/// Drops bytes up to the start of the next line that opens an array.
///
/// Returns `false` when no such line is buffered yet; the bytes that could still
/// belong to a boundary are kept so the search can resume after the next read.
fn skip_to_next_record(buffer: &mut BytesMut) -> bool {
    match buffer.windows(3).position(|window| window == b"\r\n*") {
        Some(position) => {
            buffer.advance(position + 2);
            true
        }
        None => {
            let keep = buffer.len().min(2);
            buffer.advance(buffer.len() - keep);
            false
        }
    }
}

/// Whether a line opening an array follows the first byte of `buffer`.
fn has_later_record(buffer: &[u8]) -> bool {
    buffer.windows(3).any(|window| window == b"\r\n*")
}
