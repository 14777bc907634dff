use bytes::Bytes;

use crate::{
    aof::CommandRecord,
    commands::{
        command_error::CommandError,
        command_handler::CommandOutput,
        command_utils::{keyword, parse_integer},
        expire::ExpireUnit,
    },
    key_value_store::{DataType, KeyValueStore, Value},
    resp::RespValue,
};

/// Parsed arguments of SET.
pub struct SetArguments {
    /// The key to store under.
    key: Bytes,
    /// The string to store.
    value: Bytes,
    /// `EX`, `PX`, `EXAT` or `PXAT` with its amount.
    expiration: Option<(ExpireUnit, i64)>,
    /// `KEEPTTL`: retain the expiration of the value being replaced.
    keep_ttl: bool,
}

impl SetArguments {
    /// Parses `key value [EX seconds | PX milliseconds | EXAT unix-seconds | PXAT unix-milliseconds | KEEPTTL]`.
    ///
    /// # Returns
    ///
    /// * `Err(CommandError::WrongNumberOfArguments)` - If key or value is missing
    /// * `Err(CommandError::SyntaxError)` - For unknown options, a missing amount, or
    ///   more than one expiration option
    /// * `Err(CommandError::InvalidIntegerValue)` - If the amount is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the amount is not positive
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::WrongNumberOfArguments("set".to_string()));
        }

        let mut expiration: Option<(ExpireUnit, i64)> = None;
        let mut keep_ttl = false;
        let mut options = arguments[2..].iter();

        while let Some(option) = options.next() {
            let unit = match keyword(option).as_str() {
                "KEEPTTL" if expiration.is_none() && !keep_ttl => {
                    keep_ttl = true;
                    continue;
                }
                "EX" => ExpireUnit::Seconds,
                "PX" => ExpireUnit::Milliseconds,
                "EXAT" => ExpireUnit::UnixSeconds,
                "PXAT" => ExpireUnit::UnixMilliseconds,
                _ => return Err(CommandError::SyntaxError),
            };

            if expiration.is_some() || keep_ttl {
                return Err(CommandError::SyntaxError);
            }

            let Some(amount) = options.next() else {
                return Err(CommandError::SyntaxError);
            };

            let amount = parse_integer::<i64>(amount)?;

            if amount <= 0 {
                return Err(CommandError::InvalidExpireTime("set".to_string()));
            }

            expiration = Some((unit, amount));
        }

        Ok(Self {
            key: arguments[0].clone(),
            value: arguments[1].clone(),
            expiration,
            keep_ttl,
        })
    }
}

/// Handles the Redis SET command.
///
/// Relative expirations are resolved to an absolute deadline here, and the command is
/// logged as a plain `SET` (keeping `KEEPTTL`) followed by `PEXPIREAT` with that
/// deadline, so replaying the log later restores the same instant.
///
/// # Examples
///
/// ```text
/// SET grape mango          -> SET grape mango
/// SET grape mango EX 100   -> SET grape mango, PEXPIREAT grape <now + 100s>
/// SET grape apple KEEPTTL  -> SET grape apple KEEPTTL
/// ```
pub fn set(store: &mut KeyValueStore, arguments: Vec<Bytes>) -> Result<CommandOutput, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    let deadline = match set_arguments.expiration {
        Some((unit, amount)) => match unit.deadline(amount, store.now()) {
            Some(deadline) => Some(deadline),
            None => return Err(CommandError::InvalidExpireTime("set".to_string())),
        },
        None => None,
    };

    let kept = if set_arguments.keep_ttl {
        store
            .get(&set_arguments.key)
            .and_then(|value| value.expiration)
    } else {
        None
    };

    store.set(
        set_arguments.key.clone(),
        Value {
            data: DataType::String(set_arguments.value.clone()),
            expiration: deadline.or(kept),
        },
    );

    let mut record_arguments = vec![set_arguments.key.clone(), set_arguments.value];
    if set_arguments.keep_ttl {
        record_arguments.push(Bytes::from_static(b"KEEPTTL"));
    }

    let mut records = vec![CommandRecord::new("SET", record_arguments)];
    if let Some(deadline) = deadline {
        records.push(CommandRecord::pexpireat(set_arguments.key.clone(), deadline));
    }

    Ok(CommandOutput::logged(
        RespValue::SimpleString("OK".to_string()).encode(),
        records,
    ))
}
