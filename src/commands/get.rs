use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandOutput},
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

pub struct GetArguments {
    key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("get".to_string()));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles the Redis GET command.
///
/// Replies with the string stored at the key, or null when the key does not exist
/// or has expired. Expired keys are removed on the way.
///
/// # Returns
///
/// * `Ok(CommandOutput)` - A bulk string or null
/// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 1
/// * `Err(CommandError::InvalidDataTypeForKey)` - If the key holds a list
pub fn get(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    let Some(value) = store.get(&get_arguments.key) else {
        return Ok(CommandOutput::response(RespValue::Null.encode()));
    };

    match value.data {
        DataType::String(ref s) => Ok(CommandOutput::response(
            RespValue::BulkString(s.clone()).encode(),
        )),
        DataType::Array(_) => Err(CommandError::InvalidDataTypeForKey),
    }
}
