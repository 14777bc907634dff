use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandOutput},
    resp::RespValue,
};

pub struct EchoArguments {
    message: Bytes,
}

impl EchoArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("echo".to_string()));
        }

        Ok(Self {
            message: arguments[0].clone(),
        })
    }
}

/// Handles the Redis ECHO command, replying with its single argument as a bulk string.
pub fn echo(arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let echo_arguments = EchoArguments::parse(arguments)?;

    Ok(CommandOutput::response(
        RespValue::BulkString(echo_arguments.message).encode(),
    ))
}
