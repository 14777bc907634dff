use bytes::Bytes;
use globset::Glob;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandOutput, command_utils::to_text,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct KeysArguments {
    pub pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("keys".to_string()));
        }

        let pattern = std::str::from_utf8(&arguments[0])
            .map_err(|e| CommandError::InvalidGlobPattern(e.to_string()))?;

        Ok(KeysArguments {
            pattern: pattern.to_string(),
        })
    }
}

/// Replies with every live key matching the glob pattern, sorted.
pub fn keys(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;

    let glob = Glob::new(&keys_arguments.pattern)
        .map_err(|e| CommandError::InvalidGlobPattern(e.to_string()))?
        .compile_matcher();

    let mut matching: Vec<Bytes> = store
        .live_keys()
        .into_iter()
        .filter(|key| glob.is_match(to_text(key)))
        .collect();
    matching.sort();

    Ok(CommandOutput::response(
        RespValue::Array(matching.into_iter().map(RespValue::BulkString).collect()).encode(),
    ))
}

pub struct DbSizeArguments;

impl DbSizeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("dbsize".to_string()));
        }

        Ok(Self)
    }
}

pub fn dbsize(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    DbSizeArguments::parse(arguments)?;

    Ok(CommandOutput::response(
        RespValue::Integer(store.live_keys().len() as i64).encode(),
    ))
}
