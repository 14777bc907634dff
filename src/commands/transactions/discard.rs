use bytes::Bytes;

use crate::{commands::CommandError, resp::RespValue, state::State};

pub struct DiscardArguments;

impl DiscardArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("discard".to_string()));
        }

        Ok(Self)
    }
}

pub fn discard(
    client_address: &str,
    state: &mut State,
    arguments: Vec<Bytes>,
) -> Result<Bytes, CommandError> {
    DiscardArguments::parse(arguments)?;

    let Ok(_) = state.remove_transaction(client_address) else {
        return Err(CommandError::DiscardWithoutMulti);
    };

    Ok(RespValue::SimpleString("OK".to_string()).encode())
}
