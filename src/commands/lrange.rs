use std::collections::VecDeque;

use bytes::Bytes;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandOutput,
        command_utils::parse_integer,
    },
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

/// Parsed arguments of LRANGE: the list key and an inclusive index range, where
/// negative indexes count from the end of the list.
pub struct LrangeArguments {
    key: Bytes,
    start_index: isize,
    end_index: isize,
}

impl LrangeArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::WrongNumberOfArguments("lrange".to_string()));
        }

        let start_index = parse_integer::<isize>(&arguments[1])?;
        let end_index = parse_integer::<isize>(&arguments[2])?;

        Ok(Self {
            key: arguments[0].clone(),
            start_index,
            end_index,
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// Replies with the elements between the two indexes, inclusive. A missing key or an
/// empty range yields an empty array.
///
/// ```text
/// LRANGE fruits 0 2    -> first three elements
/// LRANGE fruits -2 -1  -> last two elements
/// ```
pub fn lrange(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<CommandOutput, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let Some(value) = store.get(&lrange_arguments.key) else {
        return Ok(CommandOutput::response(RespValue::Array(Vec::new()).encode()));
    };

    let DataType::Array(ref list) = value.data else {
        return Err(CommandError::InvalidDataTypeForKey);
    };

    let Ok((start, end)) = validate_range_indexes(
        list,
        lrange_arguments.start_index,
        lrange_arguments.end_index,
    ) else {
        return Ok(CommandOutput::response(RespValue::Array(Vec::new()).encode()));
    };

    let range = list
        .range(start..=end)
        .map(|s| RespValue::BulkString(s.clone()))
        .collect::<Vec<RespValue>>();

    Ok(CommandOutput::response(RespValue::Array(range).encode()))
}

/// Clamps a possibly negative index range to the list, or explains why it is empty.
fn validate_range_indexes(
    list: &VecDeque<Bytes>,
    start_index: isize,
    end_index: isize,
) -> Result<(usize, usize), &str> {
    let len = list.len() as isize;

    if len == 0 {
        return Err("List is empty");
    }

    let mut start = if start_index < 0 {
        len + start_index
    } else {
        start_index
    };
    let mut end = if end_index < 0 {
        len + end_index
    } else {
        end_index
    };

    start = start.max(0);
    end = end.min(len - 1);

    if start >= len {
        return Err("Start index is out of bounds");
    }

    if start > end {
        return Err("Start index is bigger than end index after processing");
    }

    Ok((start as usize, end as usize))
}
