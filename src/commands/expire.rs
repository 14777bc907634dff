use bytes::Bytes;
use jiff::Timestamp;

use crate::{
    aof::CommandRecord,
    commands::{
        command_error::CommandError,
        command_handler::CommandOutput,
        command_utils::{keyword, parse_integer},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// How the numeric argument of an expiration is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireUnit {
    /// Seconds from now (`EXPIRE`, `SET .. EX`).
    Seconds,
    /// Milliseconds from now (`PEXPIRE`, `SET .. PX`).
    Milliseconds,
    /// Unix time in seconds (`EXPIREAT`, `SET .. EXAT`).
    UnixSeconds,
    /// Unix time in milliseconds (`PEXPIREAT`, `SET .. PXAT`).
    UnixMilliseconds,
}

impl ExpireUnit {
    fn command_name(&self) -> &'static str {
        match self {
            ExpireUnit::Seconds => "expire",
            ExpireUnit::Milliseconds => "pexpire",
            ExpireUnit::UnixSeconds => "expireat",
            ExpireUnit::UnixMilliseconds => "pexpireat",
        }
    }

    /// The absolute deadline, truncated to milliseconds, or `None` when it is out of range.
    pub fn deadline(&self, amount: i64, now: Timestamp) -> Option<Timestamp> {
        let millisecond = match self {
            ExpireUnit::Seconds => now.as_millisecond().checked_add(amount.checked_mul(1000)?)?,
            ExpireUnit::Milliseconds => now.as_millisecond().checked_add(amount)?,
            ExpireUnit::UnixSeconds => amount.checked_mul(1000)?,
            ExpireUnit::UnixMilliseconds => amount,
        };

        Timestamp::from_millisecond(millisecond).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireCondition {
    /// Only when the key has no expiration.
    Nx,
    /// Only when the key already has an expiration.
    Xx,
    /// Only when the new deadline is later than the current one.
    Gt,
    /// Only when the new deadline is earlier than the current one; no expiration counts as infinite.
    Lt,
}

impl ExpireCondition {
    fn parse(option: &[u8]) -> Result<Self, CommandError> {
        match keyword(option).as_str() {
            "NX" => Ok(ExpireCondition::Nx),
            "XX" => Ok(ExpireCondition::Xx),
            "GT" => Ok(ExpireCondition::Gt),
            "LT" => Ok(ExpireCondition::Lt),
            _ => Err(CommandError::SyntaxError),
        }
    }

    fn allows(&self, current: Option<Timestamp>, deadline: Timestamp) -> bool {
        match self {
            ExpireCondition::Nx => current.is_none(),
            ExpireCondition::Xx => current.is_some(),
            ExpireCondition::Gt => current.is_some_and(|current| deadline > current),
            ExpireCondition::Lt => current.map_or(true, |current| deadline < current),
        }
    }
}

pub struct ExpireArguments {
    key: Bytes,
    amount: i64,
    condition: Option<ExpireCondition>,
}

impl ExpireArguments {
    pub fn parse(arguments: Vec<Bytes>, unit: ExpireUnit) -> Result<Self, CommandError> {
        if arguments.len() != 2 && arguments.len() != 3 {
            return Err(CommandError::WrongNumberOfArguments(
                unit.command_name().to_string(),
            ));
        }

        let amount = parse_integer::<i64>(&arguments[1])?;

        let condition = match arguments.get(2) {
            Some(option) => Some(ExpireCondition::parse(option)?),
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            amount,
            condition,
        })
    }
}

/// Handles EXPIRE, PEXPIRE, EXPIREAT and PEXPIREAT.
///
/// Replies 1 when the deadline was applied and 0 when the key does not exist or the
/// condition option rejected it. The effect is logged as `PEXPIREAT key <ms>` so every
/// variant replays to the same instant. A deadline that has already passed deletes
/// the key instead and is logged as `DEL`; while replaying a log the deadline is
/// stored as-is, since the log carries its own deletions.
pub fn expire(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
    unit: ExpireUnit,
) -> Result<CommandOutput, CommandError> {
    let expire_arguments = ExpireArguments::parse(arguments, unit)?;

    let now = store.now();
    let replaying = store.is_replaying();
    let Some(deadline) = unit.deadline(expire_arguments.amount, now) else {
        return Err(CommandError::InvalidExpireTime(
            unit.command_name().to_string(),
        ));
    };

    let Some(value) = store.get_mut(&expire_arguments.key) else {
        return Ok(CommandOutput::response(RespValue::Integer(0).encode()));
    };

    if let Some(condition) = expire_arguments.condition {
        if !condition.allows(value.expiration, deadline) {
            return Ok(CommandOutput::response(RespValue::Integer(0).encode()));
        }
    }

    if deadline <= now && !replaying {
        store.delete(&expire_arguments.key);
        return Ok(CommandOutput::logged(
            RespValue::Integer(1).encode(),
            vec![CommandRecord::del([expire_arguments.key])],
        ));
    }

    value.expiration = Some(deadline);

    Ok(CommandOutput::logged(
        RespValue::Integer(1).encode(),
        vec![CommandRecord::pexpireat(expire_arguments.key, deadline)],
    ))
}

pub struct PersistArguments {
    key: Bytes,
}

impl PersistArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() != 1 {
            return Err(CommandError::WrongNumberOfArguments("persist".to_string()));
        }

        Ok(Self {
            key: arguments[0].clone(),
        })
    }
}

/// Removes the expiration of a key. Replies 1 if there was one to remove.
pub fn persist(
    store: &mut KeyValueStore,
    arguments: Vec<Bytes>,
) -> Result<CommandOutput, CommandError> {
    let persist_arguments = PersistArguments::parse(arguments)?;

    let removed = match store.get_mut(&persist_arguments.key) {
        Some(value) => value.expiration.take().is_some(),
        None => false,
    };

    if !removed {
        return Ok(CommandOutput::response(RespValue::Integer(0).encode()));
    }

    Ok(CommandOutput::logged(
        RespValue::Integer(1).encode(),
        vec![CommandRecord::new("PERSIST", [persist_arguments.key])],
    ))
}
