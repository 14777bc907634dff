use bytes::Bytes;
use thiserror::Error;

use crate::{resp::RespValue, state::StateError};

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("invalid command argument")]
    InvalidCommandArgument,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("syntax error")]
    SyntaxError,
    #[error("value is not an integer or out of range")]
    InvalidIntegerValue,
    #[error("increment or decrement would overflow")]
    IntegerOverflow,
    #[error("invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("invalid data type for key")]
    InvalidDataTypeForKey,
    #[error("invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
    #[error("transaction error")]
    TransactionError(#[from] StateError),
    #[error("EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error("append only file is disabled")]
    AofDisabled,
    #[error("'{0}' must be handled by the dispatcher")]
    NotAStoreCommand(String),
    #[error("command '{0}' panicked")]
    Panicked(String),
}

impl CommandError {
    pub fn as_bytes(&self) -> Bytes {
        match self {
            CommandError::InvalidCommand => {
                RespValue::Error("ERR Invalid command".to_string()).encode()
            }
            CommandError::InvalidCommandArgument => {
                RespValue::Error("ERR Invalid command argument".to_string()).encode()
            }
            CommandError::UnknownCommand(name) => {
                RespValue::Error(format!("ERR unknown command '{}'", name)).encode()
            }
            CommandError::WrongNumberOfArguments(name) => RespValue::Error(format!(
                "ERR wrong number of arguments for '{}' command",
                name
            ))
            .encode(),
            CommandError::SyntaxError => {
                RespValue::Error("ERR syntax error".to_string()).encode()
            }
            CommandError::InvalidIntegerValue => {
                RespValue::Error("ERR value is not an integer or out of range".to_string()).encode()
            }
            CommandError::IntegerOverflow => {
                RespValue::Error("ERR increment or decrement would overflow".to_string()).encode()
            }
            CommandError::InvalidExpireTime(name) => {
                RespValue::Error(format!("ERR invalid expire time in '{}' command", name)).encode()
            }
            CommandError::InvalidDataTypeForKey => RespValue::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            )
            .encode(),
            CommandError::InvalidGlobPattern(err) => {
                RespValue::Error(format!("ERR invalid pattern: {}", err)).encode()
            }
            CommandError::TransactionError(err) => err.as_bytes(),
            CommandError::ExecWithoutMulti => {
                RespValue::Error("ERR EXEC without MULTI".to_string()).encode()
            }
            CommandError::DiscardWithoutMulti => {
                RespValue::Error("ERR DISCARD without MULTI".to_string()).encode()
            }
            CommandError::AofDisabled => {
                RespValue::Error("ERR append only file is disabled".to_string()).encode()
            }
            CommandError::NotAStoreCommand(_) | CommandError::Panicked(_) => {
                RespValue::Error("ERR internal error".to_string()).encode()
            }
        }
    }
}
