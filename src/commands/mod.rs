mod bgrewriteaof;
mod command_error;
mod command_handler;
mod command_utils;
mod config_get;
mod del;
mod echo;
mod exists;
mod expire;
mod flushall;
mod get;
mod incr;
mod keys;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod rpush_and_lpush;
mod set;
mod transactions;
mod ttl;
mod type_command;

pub use bgrewriteaof::bgrewriteaof;
pub use command_error::CommandError;
pub use command_handler::{lookup, CommandHandler, CommandKind, CommandOutput};
pub use config_get::config_get;
pub use expire::ExpireUnit;
pub use transactions::{discard, exec, multi};
