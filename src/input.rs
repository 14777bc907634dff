//! Reading RESP commands from client streams.

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::resp::{RespError, RespValue};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Errors that can occur while reading and parsing commands from network streams.
#[derive(Error, Debug, PartialEq)]
pub enum CommandReadError {
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("RESP parse error")]
    RespParseError(#[from] RespError),
}

impl CommandReadError {
    pub fn as_bytes(&self) -> Bytes {
        match self {
            CommandReadError::IoError(msg) => RespValue::Error(format!("ERR {}", msg)).encode(),
            CommandReadError::ConnectionClosed => {
                RespValue::Error("ERR connection closed".to_string()).encode()
            }
            CommandReadError::RespParseError(err) => err.as_bytes(),
        }
    }
}

/// Reads from `stream` until `buffer` holds at least one complete RESP value, then
/// returns every complete value. A partial trailing value stays in `buffer` for the
/// next call.
///
/// A protocol error clears `buffer`, since the stream can no longer be framed.
pub async fn read_and_parse_resp<R>(
    stream: &mut R,
    buffer: &mut BytesMut,
) -> Result<Vec<RespValue>, CommandReadError>
where
    R: AsyncReadExt + Unpin,
{
    loop {
        let values = match RespValue::decode_all(buffer) {
            Ok(values) => values,
            Err(err) => {
                buffer.clear();
                return Err(err.into());
            }
        };

        if !values.is_empty() {
            return Ok(values);
        }

        buffer.reserve(READ_CHUNK_SIZE);
        let number_of_bytes = stream
            .read_buf(buffer)
            .await
            .map_err(|e| CommandReadError::IoError(e.to_string()))?;

        if number_of_bytes == 0 {
            return Err(CommandReadError::ConnectionClosed);
        }
    }
}
