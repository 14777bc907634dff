use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandOutput},
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

pub struct LlenArguments {
    key: Bytes,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("llen".to_string()));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn llen(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;

    let Some(value) = store.get(&llen_arguments.key) else {
        return Ok(CommandOutput::response(RespValue::Integer(0).encode()));
    };

    let DataType::Array(ref list) = value.data else {
        return Err(CommandError::InvalidDataTypeForKey);
    };

    Ok(CommandOutput::response(
        RespValue::Integer(list.len() as i64).encode(),
    ))
}
