use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandOutput},
    resp::RespValue,
};

pub struct PingArguments {
    message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::WrongNumberOfArguments("ping".to_string()));
        }

        Ok(Self {
            message: arguments.into_iter().next(),
        })
    }
}

pub fn ping(arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    let response = match ping_arguments.message {
        Some(message) => RespValue::BulkString(message).encode(),
        None => RespValue::SimpleString("PONG".to_string()).encode(),
    };

    Ok(CommandOutput::response(response))
}
