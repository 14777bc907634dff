use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aof::{Aof, RewriteState};

pub const DEFAULT_REWRITE_PERCENTAGE: u64 = 100;
pub const DEFAULT_REWRITE_MIN_SIZE: u64 = 64 * 1024 * 1024;
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Automatic rewrite trigger: the log has grown by `percentage` percent over its size
/// after the last rewrite, and is at least `min_size` bytes. A percentage of zero
/// disables it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewritePolicy {
    pub percentage: u64,
    pub min_size: u64,
    pub interval: Duration,
}

impl Default for RewritePolicy {
    fn default() -> Self {
        Self {
            percentage: DEFAULT_REWRITE_PERCENTAGE,
            min_size: DEFAULT_REWRITE_MIN_SIZE,
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

impl RewritePolicy {
    pub fn disabled() -> Self {
        Self {
            percentage: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.percentage > 0
    }

    pub fn should_rewrite(&self, current_size: u64, base_size: u64) -> bool {
        if !self.is_enabled() || current_size < self.min_size {
            return false;
        }

        let base = base_size.max(1);
        let growth = current_size.saturating_sub(base).saturating_mul(100) / base;
        growth >= self.percentage
    }
}

/// Polls the log size and triggers a rewrite whenever `policy` says so.
///
/// The task ends once the log is closed. Returns `None` for a disabled policy.
pub fn spawn_rewrite_policy(aof: Arc<Aof>, policy: RewritePolicy) -> Option<JoinHandle<()>> {
    if !policy.is_enabled() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(policy.interval);

        loop {
            interval.tick().await;
            if aof.is_closed() {
                debug!("AOF rewrite policy stopped");
                break;
            }

            if aof.state() != RewriteState::Idle {
                continue;
            }

            let current = match aof.current_size().await {
                Ok(size) => size,
                Err(err) => {
                    warn!(error = %err, "failed to read AOF size");
                    continue;
                }
            };

            let base = aof.base_size();
            if policy.should_rewrite(current, base) {
                info!(current, base, "AOF grew past the rewrite threshold");
                aof.trigger_rewrite();
            }
        }
    }))
}
