use bytes::Bytes;

use crate::{
    aof::CommandRecord,
    commands::{command_error::CommandError, command_handler::CommandOutput},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct DelArguments {
    keys: Vec<Bytes>,
}

impl DelArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("del".to_string()));
        }

        Ok(Self { keys: arguments })
    }
}

/// Deletes the given keys and replies with how many existed. Only the keys that were
/// actually removed are logged.
pub fn del(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let del_arguments = DelArguments::parse(arguments)?;

    let removed: Vec<Bytes> = del_arguments
        .keys
        .into_iter()
        .filter(|key| store.delete(key))
        .collect();

    let response = RespValue::Integer(removed.len() as i64).encode();

    if removed.is_empty() {
        return Ok(CommandOutput::response(response));
    }

    Ok(CommandOutput::logged(
        response,
        vec![CommandRecord::del(removed)],
    ))
}
