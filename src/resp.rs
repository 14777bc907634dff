//! Redis Serialization Protocol (RESP) values.
//!
//! The same encoding is used for client traffic and for the append-only file, so
//! the log is literally replayable client input. Decoding is incremental: bytes
//! are consumed from a [`BytesMut`] only once a complete value is available.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Arrays nested deeper than this are rejected; commands are flat arrays.
pub const MAX_NESTING_DEPTH: usize = 32;
/// Largest accepted bulk string, matching Redis' default `proto-max-bulk-len`.
pub const MAX_BULK_LENGTH: usize = 512 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum RespError {
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("unknown RESP type")]
    UnknownRespType(u8),
    #[error("failed to parse integer")]
    FailedToParseInteger,
    #[error("invalid bulk string")]
    InvalidBulkString,
    #[error("invalid array")]
    InvalidArray,
    #[error("arrays nested too deeply")]
    NestingTooDeep,
}

impl RespError {
    pub fn as_bytes(&self) -> Bytes {
        RespValue::Error(format!("ERR Protocol error: {}", self)).encode()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    /// Binary safe: any bytes, including CR, LF and invalid UTF-8.
    BulkString(Bytes),
    Array(Vec<RespValue>),
    Null,
    NullArray,
}

impl RespValue {
    /// A bulk string holding a copy of `value`.
    pub fn bulk_string(value: impl AsRef<[u8]>) -> Self {
        RespValue::BulkString(Bytes::copy_from_slice(value.as_ref()))
    }

    pub fn encode(&self) -> Bytes {
        let mut encoded = BytesMut::new();
        self.encode_into(&mut encoded);
        encoded.freeze()
    }

    pub fn encode_into(&self, encoded: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                encoded.put_u8(b'+');
                encoded.put_slice(s.as_bytes());
                encoded.put_slice(b"\r\n");
            }
            RespValue::Error(msg) => {
                encoded.put_u8(b'-');
                encoded.put_slice(msg.as_bytes());
                encoded.put_slice(b"\r\n");
            }
            RespValue::Integer(i) => encoded.put_slice(format!(":{}\r\n", i).as_bytes()),
            RespValue::BulkString(data) => {
                encoded.put_slice(format!("${}\r\n", data.len()).as_bytes());
                encoded.put_slice(data);
                encoded.put_slice(b"\r\n");
            }
            RespValue::Array(elements) => {
                encoded.put_slice(format!("*{}\r\n", elements.len()).as_bytes());
                for element in elements {
                    element.encode_into(encoded);
                }
            }
            RespValue::Null => encoded.put_slice(b"$-1\r\n"),
            RespValue::NullArray => encoded.put_slice(b"*-1\r\n"),
        }
    }

    /// Decodes a single value from the front of `buffer`.
    ///
    /// Returns `Ok(None)` when the buffer holds an incomplete value; nothing is
    /// consumed in that case. On success the value's bytes are removed from the buffer.
    pub fn decode(buffer: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        match Self::decode_at(buffer, 0, 0)? {
            Some((value, consumed)) => {
                buffer.advance(consumed);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Decodes every complete value in `buffer`, leaving any trailing partial value in place.
    pub fn decode_all(buffer: &mut BytesMut) -> Result<Vec<RespValue>, RespError> {
        let mut values = Vec::new();

        while let Some(value) = Self::decode(buffer)? {
            values.push(value);
        }

        Ok(values)
    }

    fn decode_at(
        buffer: &[u8],
        start: usize,
        depth: usize,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, next)) = read_line(buffer, start) else {
            return Ok(None);
        };

        let Some((&prefix, content)) = line.split_first() else {
            return Err(RespError::UnknownRespType(b'\r'));
        };

        match prefix {
            b'+' => Ok(Some((RespValue::SimpleString(to_string(content)?), next - start))),
            b'-' => Ok(Some((RespValue::Error(to_string(content)?), next - start))),
            b':' => Ok(Some((RespValue::Integer(parse_integer(content)?), next - start))),
            b'$' => {
                let length = parse_integer(content).map_err(|_| RespError::InvalidBulkString)?;

                if length == -1 {
                    return Ok(Some((RespValue::Null, next - start)));
                }

                let length =
                    usize::try_from(length).map_err(|_| RespError::InvalidBulkString)?;
                if length > MAX_BULK_LENGTH {
                    return Err(RespError::InvalidBulkString);
                }
                let end = next + length;

                if buffer.len() < end + 2 {
                    return Ok(None);
                }

                if &buffer[end..end + 2] != b"\r\n" {
                    return Err(RespError::InvalidBulkString);
                }

                let content = Bytes::copy_from_slice(&buffer[next..end]);
                Ok(Some((RespValue::BulkString(content), end + 2 - start)))
            }
            b'*' => {
                if depth >= MAX_NESTING_DEPTH {
                    return Err(RespError::NestingTooDeep);
                }

                let length = parse_integer(content).map_err(|_| RespError::InvalidArray)?;

                if length == -1 {
                    return Ok(Some((RespValue::NullArray, next - start)));
                }

                let length = usize::try_from(length).map_err(|_| RespError::InvalidArray)?;
                let mut elements = Vec::with_capacity(length.min(1024));
                let mut cursor = next;

                while elements.len() < length {
                    let Some((element, consumed)) = Self::decode_at(buffer, cursor, depth + 1)?
                    else {
                        return Ok(None);
                    };
                    elements.push(element);
                    cursor += consumed;
                }

                Ok(Some((RespValue::Array(elements), cursor - start)))
            }
            other => Err(RespError::UnknownRespType(other)),
        }
    }
}

/// Returns the line starting at `start` without its CRLF, and the offset just past the CRLF.
fn read_line(buffer: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let position = buffer[start..]
        .windows(2)
        .position(|window| window == b"\r\n")?;

    Some((&buffer[start..start + position], start + position + 2))
}

fn to_string(bytes: &[u8]) -> Result<String, RespError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| RespError::InvalidUtf8)
}

fn parse_integer(bytes: &[u8]) -> Result<i64, RespError> {
    std::str::from_utf8(bytes)
        .map_err(|_| RespError::InvalidUtf8)?
        .parse::<i64>()
        .map_err(|_| RespError::FailedToParseInteger)
}
