//! A Redis-compatible server with append-only file persistence.
//!
//! Every write is recorded as a RESP command in an append-only file, and the file is
//! replayed on startup to restore the dataset. The log is compacted in the background
//! by a rewrite that never blocks clients for more than a file swap.
//!
//! Supported commands cover strings, lists, expiration, key inspection, transactions
//! (MULTI/EXEC/DISCARD), BGREWRITEAOF and CONFIG GET.

pub mod aof;
pub mod commands;
pub mod config;
pub mod connection;
pub mod database;
pub mod input;
pub mod key_value_store;
pub mod resp;
pub mod server;
pub mod state;
