use bytes::Bytes;

use crate::{
    aof::CommandRecord,
    commands::{command_error::CommandError, command_handler::CommandOutput, command_utils::keyword},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct FlushAllArguments;

impl FlushAllArguments {
    /// Accepts the `ASYNC`/`SYNC` modifiers; both flush immediately.
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        match arguments.as_slice() {
            [] => Ok(Self),
            [mode] if matches!(keyword(mode).as_str(), "ASYNC" | "SYNC") => Ok(Self),
            _ => Err(CommandError::SyntaxError),
        }
    }
}

pub fn flushall(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<CommandOutput, CommandError> {
    FlushAllArguments::parse(arguments)?;
    store.clear();

    Ok(CommandOutput::logged(
        RespValue::SimpleString("OK".to_string()).encode(),
        vec![CommandRecord::new("FLUSHALL", Vec::<Bytes>::new())],
    ))
}
