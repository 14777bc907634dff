use std::collections::VecDeque;

use bytes::Bytes;

use crate::{
    aof::CommandRecord,
    commands::{command_error::CommandError, command_handler::CommandOutput},
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

pub struct PushArrayOperations {
    key: Bytes,
    values: Vec<Bytes>,
}

impl PushArrayOperations {
    pub fn parse(arguments: Vec<Bytes>, should_prepend: bool) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            let name = if should_prepend { "lpush" } else { "rpush" };
            return Err(CommandError::WrongNumberOfArguments(name.to_string()));
        }

        Ok(Self {
            key: arguments[0].clone(),
            values: arguments[1..].to_vec(),
        })
    }
}

pub fn rpush(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    push_array_operations(store, arguments, false)
}

pub fn lpush(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    push_array_operations(store, arguments, true)
}

fn push_array_operations(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    should_prepend: bool,
) -> Result<CommandOutput, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, should_prepend)?;

    let list_length = match store.get_mut(&push_array_arguments.key) {
        Some(value) => {
            let DataType::Array(ref mut list) = value.data else {
                return Err(CommandError::InvalidDataTypeForKey);
            };

            add_values_to_list(list, &push_array_arguments.values, should_prepend);
            list.len()
        }
        None => {
            let mut list = VecDeque::new();
            add_values_to_list(&mut list, &push_array_arguments.values, should_prepend);

            let list_length = list.len();
            store.set(
                push_array_arguments.key.clone(),
                Value::new(DataType::Array(list)),
            );
            list_length
        }
    };

    let name = if should_prepend { "LPUSH" } else { "RPUSH" };
    let mut record_arguments = Vec::with_capacity(push_array_arguments.values.len() + 1);
    record_arguments.push(push_array_arguments.key);
    record_arguments.extend(push_array_arguments.values);

    Ok(CommandOutput::logged(
        RespValue::Integer(list_length as i64).encode(),
        vec![CommandRecord::new(name, record_arguments)],
    ))
}

fn add_values_to_list(list: &mut VecDeque<Bytes>, values: &[Bytes], should_prepend: bool) {
    for value in values {
        if should_prepend {
            list.push_front(value.clone());
        } else {
            list.push_back(value.clone());
        }
    }
}
