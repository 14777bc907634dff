use std::path::PathBuf;

use clap::{ArgAction, Parser};
use thiserror::Error;

use crate::aof::{
    AofConfig, RewritePolicy, DEFAULT_CHECK_INTERVAL, DEFAULT_QUEUE_SIZE,
    DEFAULT_REWRITE_MIN_SIZE, DEFAULT_REWRITE_PERCENTAGE,
};

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_APPEND_FILENAME: &str = "appendonly.aof";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    InvalidArguments(#[from] clap::Error),
}

/// Command line configuration, with Redis-style flag names.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "redis-aof", version, about = "Redis-compatible server with append-only file persistence")]
pub struct ServerConfig {
    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding the append-only file.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Whether writes are persisted to the append-only file (`yes` or `no`).
    #[arg(long, default_value = "no", value_parser = parse_yes_no, action = ArgAction::Set)]
    pub appendonly: bool,

    /// Name of the append-only file inside `--dir`.
    #[arg(long, default_value = DEFAULT_APPEND_FILENAME)]
    pub appendfilename: String,

    /// Capacity of the append queue; appends wait while it is full.
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE)]
    pub aof_queue_size: usize,

    /// Growth over the post-rewrite size, in percent, that triggers a rewrite (0 disables).
    #[arg(long, default_value_t = DEFAULT_REWRITE_PERCENTAGE)]
    pub auto_aof_rewrite_percentage: u64,

    /// Minimum log size in bytes before an automatic rewrite is considered.
    #[arg(long, default_value_t = DEFAULT_REWRITE_MIN_SIZE)]
    pub auto_aof_rewrite_min_size: u64,
}

fn parse_yes_no(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(format!("expected 'yes' or 'no', got '{}'", other)),
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            dir: PathBuf::from("."),
            appendonly: false,
            appendfilename: DEFAULT_APPEND_FILENAME.to_string(),
            aof_queue_size: DEFAULT_QUEUE_SIZE,
            auto_aof_rewrite_percentage: DEFAULT_REWRITE_PERCENTAGE,
            auto_aof_rewrite_min_size: DEFAULT_REWRITE_MIN_SIZE,
        }
    }
}

impl ServerConfig {
    /// Parses the process arguments; the first item is the program name.
    pub fn new<I, T>(command_line_args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::try_parse_from(command_line_args)?)
    }

    pub fn aof_path(&self) -> PathBuf {
        self.dir.join(&self.appendfilename)
    }

    pub fn rewrite_policy(&self) -> RewritePolicy {
        RewritePolicy {
            percentage: self.auto_aof_rewrite_percentage,
            min_size: self.auto_aof_rewrite_min_size,
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// The append-only file settings, or `None` when persistence is off.
    pub fn aof_config(&self) -> Option<AofConfig> {
        if !self.appendonly {
            return None;
        }

        Some(AofConfig {
            path: self.aof_path(),
            queue_size: self.aof_queue_size,
            rewrite_policy: self.rewrite_policy(),
        })
    }

    /// Parameters readable through `CONFIG GET`.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("port", self.port.to_string()),
            ("dir", self.dir.display().to_string()),
            ("appendonly", yes_no(self.appendonly)),
            ("appendfilename", self.appendfilename.clone()),
            (
                "auto-aof-rewrite-percentage",
                self.auto_aof_rewrite_percentage.to_string(),
            ),
            (
                "auto-aof-rewrite-min-size",
                self.auto_aof_rewrite_min_size.to_string(),
            ),
        ]
    }
}
