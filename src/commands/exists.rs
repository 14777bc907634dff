use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandOutput},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct ExistsArguments {
    keys: Vec<Bytes>,
}

impl ExistsArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("exists".to_string()));
        }

        Ok(Self { keys: arguments })
    }
}

/// Counts how many of the given keys exist. A key named twice is counted twice.
pub fn exists(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<CommandOutput, CommandError> {
    let exists_arguments = ExistsArguments::parse(arguments)?;

    let count = exists_arguments
        .keys
        .iter()
        .filter(|key| store.contains_key(key))
        .count();

    Ok(CommandOutput::response(
        RespValue::Integer(count as i64).encode(),
    ))
}
