use bytes::Bytes;

use crate::{
    aof::CommandRecord,
    commands::{
        command_error::CommandError, command_handler::CommandOutput,
        command_utils::parse_integer,
    },
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

pub struct LpopArguments {
    key: Bytes,
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::WrongNumberOfArguments("lpop".to_string()));
        }

        let count = match arguments.get(1) {
            Some(count) => Some(parse_integer::<usize>(count)?),
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the Redis LPOP command.
///
/// Without a count, pops one element and replies with it as a bulk string (null when
/// the key does not exist). With a count, replies with an array of up to `count`
/// elements (a null array when the key does not exist). A list left empty is removed.
pub fn lpop(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let Some(value) = store.get_mut(&lpop_arguments.key) else {
        let response = match lpop_arguments.count {
            Some(_) => RespValue::NullArray.encode(),
            None => RespValue::Null.encode(),
        };
        return Ok(CommandOutput::response(response));
    };

    let DataType::Array(ref mut list) = value.data else {
        return Err(CommandError::InvalidDataTypeForKey);
    };

    let amount = lpop_arguments.count.unwrap_or(1).min(list.len());
    let popped: Vec<Bytes> = list.drain(..amount).collect();
    let now_empty = list.is_empty();

    if now_empty {
        store.delete(&lpop_arguments.key);
    }

    let response = match lpop_arguments.count {
        Some(_) => RespValue::Array(popped.iter().cloned().map(RespValue::BulkString).collect())
            .encode(),
        None => match popped.first() {
            Some(element) => RespValue::BulkString(element.clone()).encode(),
            None => RespValue::Null.encode(),
        },
    };

    if popped.is_empty() {
        return Ok(CommandOutput::response(response));
    }

    let mut record_arguments = vec![lpop_arguments.key];
    if let Some(count) = lpop_arguments.count {
        record_arguments.push(Bytes::from(count.to_string()));
    }

    Ok(CommandOutput::logged(
        response,
        vec![CommandRecord::new("LPOP", record_arguments)],
    ))
}
