use std::panic::{catch_unwind, AssertUnwindSafe};

use bytes::Bytes;
use tracing::error;

use crate::{
    aof::CommandRecord,
    commands::{
        bgrewriteaof::BgRewriteAofArguments,
        command_error::CommandError,
        command_utils::{keyword, to_text},
        config_get::ConfigGetArguments,
        del::{del, DelArguments},
        echo::{echo, EchoArguments},
        exists::{exists, ExistsArguments},
        expire::{expire, persist, ExpireArguments, ExpireUnit, PersistArguments},
        flushall::{flushall, FlushAllArguments},
        get::{get, GetArguments},
        incr::{incr_by, IncrArguments, IncrKind},
        keys::{dbsize, keys, DbSizeArguments, KeysArguments},
        llen::{llen, LlenArguments},
        lpop::{lpop, LpopArguments},
        lrange::{lrange, LrangeArguments},
        ping::{ping, PingArguments},
        rpush_and_lpush::{lpush, rpush, PushArrayOperations},
        set::{set, SetArguments},
        transactions::{DiscardArguments, ExecArguments, MultiArguments},
        ttl::{ttl, TtlArguments, TtlUnit},
        type_command::{type_command, TypeArguments},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Every command the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Ping,
    Echo,
    Get,
    Exists,
    Type,
    Keys,
    DbSize,
    Ttl,
    PTtl,
    LRange,
    LLen,
    Set,
    Del,
    Incr,
    Decr,
    IncrBy,
    DecrBy,
    RPush,
    LPush,
    LPop,
    Expire,
    PExpire,
    ExpireAt,
    PExpireAt,
    Persist,
    FlushAll,
    Multi,
    Exec,
    Discard,
    BgRewriteAof,
    ConfigGet,
}

/// Resolves a command name, case-insensitively.
pub fn lookup(name: &str) -> Option<CommandKind> {
    let kind = match name.to_lowercase().as_str() {
        "ping" => CommandKind::Ping,
        "echo" => CommandKind::Echo,
        "get" => CommandKind::Get,
        "exists" => CommandKind::Exists,
        "type" => CommandKind::Type,
        "keys" => CommandKind::Keys,
        "dbsize" => CommandKind::DbSize,
        "ttl" => CommandKind::Ttl,
        "pttl" => CommandKind::PTtl,
        "lrange" => CommandKind::LRange,
        "llen" => CommandKind::LLen,
        "set" => CommandKind::Set,
        "del" => CommandKind::Del,
        "incr" => CommandKind::Incr,
        "decr" => CommandKind::Decr,
        "incrby" => CommandKind::IncrBy,
        "decrby" => CommandKind::DecrBy,
        "rpush" => CommandKind::RPush,
        "lpush" => CommandKind::LPush,
        "lpop" => CommandKind::LPop,
        "expire" => CommandKind::Expire,
        "pexpire" => CommandKind::PExpire,
        "expireat" => CommandKind::ExpireAt,
        "pexpireat" => CommandKind::PExpireAt,
        "persist" => CommandKind::Persist,
        "flushall" => CommandKind::FlushAll,
        "multi" => CommandKind::Multi,
        "exec" => CommandKind::Exec,
        "discard" => CommandKind::Discard,
        "bgrewriteaof" => CommandKind::BgRewriteAof,
        "config get" => CommandKind::ConfigGet,
        _ => return None,
    };

    Some(kind)
}

/// What a command produced: the reply for the client and the records that reproduce
/// its effect when replayed. Reads produce no records.
#[derive(Debug, PartialEq)]
pub struct CommandOutput {
    pub response: Bytes,
    pub aof_records: Vec<CommandRecord>,
}

impl CommandOutput {
    pub fn response(response: Bytes) -> Self {
        Self {
            response,
            aof_records: Vec::new(),
        }
    }

    pub fn logged(response: Bytes, aof_records: Vec<CommandRecord>) -> Self {
        Self {
            response,
            aof_records,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub kind: CommandKind,
    pub arguments: Vec<Bytes>,
}

impl CommandHandler {
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = input else {
            return Err(CommandError::InvalidCommand);
        };

        let mut parts = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                RespValue::BulkString(s) => parts.push(s),
                _ => return Err(CommandError::InvalidCommand),
            }
        }

        let mut parts = parts.into_iter();
        let Some(name) = parts.next() else {
            return Err(CommandError::InvalidCommand);
        };

        Self::from_parts(&to_text(&name), parts.collect())
    }

    /// Builds a handler for a record read back from the log, validating its arguments.
    pub fn from_record(record: CommandRecord) -> Result<Self, CommandError> {
        let handler = Self::from_parts(&record.name, record.arguments)?;

        match handler.validate_command_arguments() {
            Some(err) => Err(err),
            None => Ok(handler),
        }
    }

    fn from_parts(name: &str, mut arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut name = name.to_uppercase();

        if name == "CONFIG" {
            if arguments.is_empty() {
                return Err(CommandError::WrongNumberOfArguments("config".to_string()));
            }

            let sub_command = keyword(&arguments.remove(0));
            name = format!("CONFIG {}", sub_command);
        }

        let Some(kind) = lookup(&name) else {
            return Err(CommandError::UnknownCommand(name));
        };

        Ok(Self {
            name,
            kind,
            arguments,
        })
    }

    /// Checks arity and argument syntax without touching the store.
    pub fn validate_command_arguments(&self) -> Option<CommandError> {
        let arguments = self.arguments.clone();

        match self.kind {
            CommandKind::Ping => PingArguments::parse(arguments).err(),
            CommandKind::Echo => EchoArguments::parse(arguments).err(),
            CommandKind::Get => GetArguments::parse(arguments).err(),
            CommandKind::Exists => ExistsArguments::parse(arguments).err(),
            CommandKind::Type => TypeArguments::parse(arguments).err(),
            CommandKind::Keys => KeysArguments::parse(arguments).err(),
            CommandKind::DbSize => DbSizeArguments::parse(arguments).err(),
            CommandKind::Ttl => TtlArguments::parse(arguments, TtlUnit::Seconds).err(),
            CommandKind::PTtl => TtlArguments::parse(arguments, TtlUnit::Milliseconds).err(),
            CommandKind::LRange => LrangeArguments::parse(arguments).err(),
            CommandKind::LLen => LlenArguments::parse(arguments).err(),
            CommandKind::Set => SetArguments::parse(arguments).err(),
            CommandKind::Del => DelArguments::parse(arguments).err(),
            CommandKind::Incr => IncrArguments::parse(arguments, IncrKind::Incr).err(),
            CommandKind::Decr => IncrArguments::parse(arguments, IncrKind::Decr).err(),
            CommandKind::IncrBy => IncrArguments::parse(arguments, IncrKind::IncrBy).err(),
            CommandKind::DecrBy => IncrArguments::parse(arguments, IncrKind::DecrBy).err(),
            CommandKind::RPush => PushArrayOperations::parse(arguments, false).err(),
            CommandKind::LPush => PushArrayOperations::parse(arguments, true).err(),
            CommandKind::LPop => LpopArguments::parse(arguments).err(),
            CommandKind::Expire => ExpireArguments::parse(arguments, ExpireUnit::Seconds).err(),
            CommandKind::PExpire => {
                ExpireArguments::parse(arguments, ExpireUnit::Milliseconds).err()
            }
            CommandKind::ExpireAt => {
                ExpireArguments::parse(arguments, ExpireUnit::UnixSeconds).err()
            }
            CommandKind::PExpireAt => {
                ExpireArguments::parse(arguments, ExpireUnit::UnixMilliseconds).err()
            }
            CommandKind::Persist => PersistArguments::parse(arguments).err(),
            CommandKind::FlushAll => FlushAllArguments::parse(arguments).err(),
            CommandKind::Multi => MultiArguments::parse(arguments).err(),
            CommandKind::Exec => ExecArguments::parse(arguments).err(),
            CommandKind::Discard => DiscardArguments::parse(arguments).err(),
            CommandKind::BgRewriteAof => BgRewriteAofArguments::parse(arguments).err(),
            CommandKind::ConfigGet => ConfigGetArguments::parse(arguments).err(),
        }
    }

    /// Runs the command against `store`.
    ///
    /// A panic inside the command is caught and reported as an error for this command
    /// alone; the store keeps whatever the command had changed before panicking.
    pub fn execute(&self, store: &mut KeyValueStore) -> Result<CommandOutput, CommandError> {
        match catch_unwind(AssertUnwindSafe(|| self.dispatch(store))) {
            Ok(result) => result,
            Err(_) => {
                error!(command = %self.name, "command panicked");
                Err(CommandError::Panicked(self.name.clone()))
            }
        }
    }

    fn dispatch(&self, store: &mut KeyValueStore) -> Result<CommandOutput, CommandError> {
        let arguments = self.arguments.clone();

        match self.kind {
            CommandKind::Ping => ping(arguments),
            CommandKind::Echo => echo(arguments),
            CommandKind::Get => get(store, arguments),
            CommandKind::Exists => exists(store, arguments),
            CommandKind::Type => type_command(store, arguments),
            CommandKind::Keys => keys(store, arguments),
            CommandKind::DbSize => dbsize(store, arguments),
            CommandKind::Ttl => ttl(store, arguments, TtlUnit::Seconds),
            CommandKind::PTtl => ttl(store, arguments, TtlUnit::Milliseconds),
            CommandKind::LRange => lrange(store, arguments),
            CommandKind::LLen => llen(store, arguments),
            CommandKind::Set => set(store, arguments),
            CommandKind::Del => del(store, arguments),
            CommandKind::Incr => incr_by(store, arguments, IncrKind::Incr),
            CommandKind::Decr => incr_by(store, arguments, IncrKind::Decr),
            CommandKind::IncrBy => incr_by(store, arguments, IncrKind::IncrBy),
            CommandKind::DecrBy => incr_by(store, arguments, IncrKind::DecrBy),
            CommandKind::RPush => rpush(store, arguments),
            CommandKind::LPush => lpush(store, arguments),
            CommandKind::LPop => lpop(store, arguments),
            CommandKind::Expire => expire(store, arguments, ExpireUnit::Seconds),
            CommandKind::PExpire => expire(store, arguments, ExpireUnit::Milliseconds),
            CommandKind::ExpireAt => expire(store, arguments, ExpireUnit::UnixSeconds),
            CommandKind::PExpireAt => expire(store, arguments, ExpireUnit::UnixMilliseconds),
            CommandKind::Persist => persist(store, arguments),
            CommandKind::FlushAll => flushall(store, arguments),
            CommandKind::Multi
            | CommandKind::Exec
            | CommandKind::Discard
            | CommandKind::BgRewriteAof
            | CommandKind::ConfigGet => Err(CommandError::NotAStoreCommand(self.name.clone())),
        }
    }
}
