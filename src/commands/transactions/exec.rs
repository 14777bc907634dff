use bytes::Bytes;

use crate::{commands::CommandError, commands::CommandHandler, state::State};

pub struct ExecArguments;

impl ExecArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("exec".to_string()));
        }

        Ok(Self)
    }
}

/// Ends the client's transaction and hands back its queued commands, in order, for the
/// dispatcher to run as one batch.
pub fn exec(
    client_address: &str,
    state: &mut State,
    arguments: Vec<Bytes>,
) -> Result<Vec<CommandHandler>, CommandError> {
    ExecArguments::parse(arguments)?;

    let Ok(transaction) = state.remove_transaction(client_address) else {
        return Err(CommandError::ExecWithoutMulti);
    };

    Ok(transaction)
}
