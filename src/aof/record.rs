use bytes::{Bytes, BytesMut};
use jiff::Timestamp;

use crate::{aof::AofError, resp::RespValue};

/// One entry of the append-only file: a command name followed by its arguments,
/// stored as a RESP array of bulk strings. Arguments are raw bytes.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CommandRecord {
    pub name: String,
    pub arguments: Vec<Bytes>,
}

impl CommandRecord {
    pub fn new<N, I, A>(name: N, arguments: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<Bytes>,
    {
        Self {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }

    /// `PEXPIREAT key <unix ms>`: expirations are logged as absolute instants so a
    /// later replay restores the same deadline rather than the same duration.
    pub fn pexpireat(key: impl Into<Bytes>, expiration: Timestamp) -> Self {
        Self::new(
            "PEXPIREAT",
            [
                key.into(),
                Bytes::from(expiration.as_millisecond().to_string()),
            ],
        )
    }

    pub fn del<I, A>(keys: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Bytes>,
    {
        Self::new("DEL", keys)
    }

    pub fn to_resp(&self) -> RespValue {
        let mut elements = Vec::with_capacity(self.arguments.len() + 1);
        elements.push(RespValue::bulk_string(&self.name));
        elements.extend(
            self.arguments
                .iter()
                .map(|argument| RespValue::BulkString(argument.clone())),
        );

        RespValue::Array(elements)
    }

    pub fn encode(&self) -> Bytes {
        self.to_resp().encode()
    }

    pub fn from_resp(value: RespValue) -> Result<Self, AofError> {
        let RespValue::Array(elements) = value else {
            return Err(AofError::NotACommand);
        };

        let mut parts = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                RespValue::BulkString(part) => parts.push(part),
                _ => return Err(AofError::NotACommand),
            }
        }

        let mut parts = parts.into_iter();
        let Some(name) = parts.next() else {
            return Err(AofError::NotACommand);
        };
        let name = String::from_utf8(name.to_vec()).map_err(|_| AofError::NotACommand)?;

        Ok(Self {
            name,
            arguments: parts.collect(),
        })
    }

    /// Decodes the next record from `buffer`; `Ok(None)` means more bytes are needed.
    pub fn decode(buffer: &mut BytesMut) -> Result<Option<Self>, AofError> {
        match RespValue::decode(buffer)? {
            Some(value) => Self::from_resp(value).map(Some),
            None => Ok(None),
        }
    }
}
