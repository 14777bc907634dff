use bytes::Bytes;

use crate::{commands::CommandError, resp::RespValue, state::State};

pub struct MultiArguments;

impl MultiArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("multi".to_string()));
        }

        Ok(Self)
    }
}

pub fn multi(
    client_address: &str,
    state: &mut State,
    arguments: Vec<Bytes>,
) -> Result<Bytes, CommandError> {
    MultiArguments::parse(arguments)?;

    state.start_transaction(client_address.to_string())?;

    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
