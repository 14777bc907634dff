use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandOutput},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct TypeArguments {
    key: Bytes,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("type".to_string()));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

pub fn type_command(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<CommandOutput, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;

    let type_name = match store.get(&type_arguments.key) {
        Some(value) => value.data.type_name(),
        None => "none",
    };

    Ok(CommandOutput::response(
        RespValue::SimpleString(type_name.to_string()).encode(),
    ))
}
