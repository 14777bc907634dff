use bytes::Bytes;

use crate::{
    aof::CommandRecord,
    commands::{
        command_error::CommandError, command_handler::CommandOutput,
        command_utils::parse_integer,
    },
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrKind {
    Incr,
    Decr,
    IncrBy,
    DecrBy,
}

impl IncrKind {
    fn name(&self) -> &'static str {
        match self {
            IncrKind::Incr => "INCR",
            IncrKind::Decr => "DECR",
            IncrKind::IncrBy => "INCRBY",
            IncrKind::DecrBy => "DECRBY",
        }
    }
}

pub struct IncrArguments {
    key: Bytes,
    delta: i64,
    /// Arguments exactly as received, for the log.
    raw: Vec<Bytes>,
}

impl IncrArguments {
    pub fn parse(arguments: Vec<Bytes>, kind: IncrKind) -> Result<Self, CommandError> {
        let expected_len = match kind {
            IncrKind::Incr | IncrKind::Decr => 1,
            IncrKind::IncrBy | IncrKind::DecrBy => 2,
        };

        if arguments.len() != expected_len {
            return Err(CommandError::WrongNumberOfArguments(
                kind.name().to_lowercase(),
            ));
        }

        let delta = match kind {
            IncrKind::Incr => 1,
            IncrKind::Decr => -1,
            IncrKind::IncrBy | IncrKind::DecrBy => {
                let amount = parse_integer::<i64>(&arguments[1])?;

                if kind == IncrKind::DecrBy {
                    amount.checked_neg().ok_or(CommandError::IntegerOverflow)?
                } else {
                    amount
                }
            }
        };

        Ok(Self {
            key: arguments[0].clone(),
            delta,
            raw: arguments,
        })
    }
}

/// Handles INCR, DECR, INCRBY and DECRBY. A missing key starts from 0; the expiration
/// of an existing key is kept.
pub fn incr_by(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    kind: IncrKind,
) -> Result<CommandOutput, CommandError> {
    let incr_arguments = IncrArguments::parse(arguments, kind)?;

    let result = match store.get_mut(&incr_arguments.key) {
        Some(value) => {
            let DataType::String(ref mut stored_data) = value.data else {
                return Err(CommandError::InvalidDataTypeForKey);
            };

            let current = parse_integer::<i64>(stored_data)?;
            let result = current
                .checked_add(incr_arguments.delta)
                .ok_or(CommandError::IntegerOverflow)?;
            *stored_data = Bytes::from(result.to_string());
            result
        }
        None => {
            store.set(
                incr_arguments.key.clone(),
                Value::new(DataType::String(Bytes::from(incr_arguments.delta.to_string()))),
            );
            incr_arguments.delta
        }
    };

    Ok(CommandOutput::logged(
        RespValue::Integer(result).encode(),
        vec![CommandRecord::new(kind.name(), incr_arguments.raw)],
    ))
}
