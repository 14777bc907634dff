use std::sync::Arc;

use bytes::Bytes;

use crate::{
    aof::{Aof, RewriteState},
    commands::CommandError,
    resp::RespValue,
};

pub struct BgRewriteAofArguments;

impl BgRewriteAofArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if !arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments(
                "bgrewriteaof".to_string(),
            ));
        }

        Ok(Self)
    }
}

/// Starts a background rewrite of the append-only file.
///
/// A request while a rewrite is already running is acknowledged but ignored.
pub fn bgrewriteaof(aof: Option<&Arc<Aof>>, arguments: Vec<Bytes>) -> Result<Bytes, CommandError> {
    BgRewriteAofArguments::parse(arguments)?;

    let Some(aof) = aof else {
        return Err(CommandError::AofDisabled);
    };

    let message = if aof.state() == RewriteState::Idle {
        aof.trigger_rewrite();
        "Background append only file rewriting started"
    } else {
        "Background append only file rewriting already in progress"
    };

    Ok(RespValue::SimpleString(message.to_string()).encode())
}
