use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandOutput},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlUnit {
    Seconds,
    Milliseconds,
}

pub struct TtlArguments {
    key: Bytes,
}

impl TtlArguments {
    pub fn parse(arguments: Vec<Bytes>, unit: TtlUnit) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            let name = match unit {
                TtlUnit::Seconds => "ttl",
                TtlUnit::Milliseconds => "pttl",
            };
            return Err(CommandError::WrongNumberOfArguments(name.to_string()));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Handles TTL and PTTL: -2 for a missing key, -1 for a key without expiration,
/// otherwise the time left.
pub fn ttl(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    unit: TtlUnit,
) -> Result<CommandOutput, CommandError> {
    let ttl_arguments = TtlArguments::parse(arguments, unit)?;
    let now = store.now();

    let remaining = match store.get(&ttl_arguments.key) {
        None => -2,
        Some(value) => match value.expiration {
            None => -1,
            Some(expiration) => {
                let millis = (expiration.as_millisecond() - now.as_millisecond()).max(0);
                match unit {
                    TtlUnit::Milliseconds => millis,
                    TtlUnit::Seconds => (millis + 500) / 1000,
                }
            }
        },
    };

    Ok(CommandOutput::response(
        RespValue::Integer(remaining).encode(),
    ))
}
