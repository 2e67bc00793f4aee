//! Sentinel files and waiting on them.

use std::path::Path;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RunnerConfig;
use crate::error::WaitError;

pub fn sentinel_exists(path: &Path) -> bool {
    path.is_file()
}

/// Exponential backoff bounded by an overall timeout.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub timeout: Duration,
}

impl WaitPolicy {
    pub fn from_config(cfg: &RunnerConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(cfg.wait_initial_ms.max(1)),
            max_delay: Duration::from_millis(cfg.wait_max_ms.max(cfg.wait_initial_ms).max(1)),
            timeout: Duration::from_secs(cfg.wait_timeout_secs),
        }
    }

    /// Delay before poll number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.min(20);
        self.initial_delay.saturating_mul(exp).min(self.max_delay)
    }
}

/// Poll `check` until it returns true or the policy's timeout elapses.
pub async fn wait_until<F>(what: &str, policy: &WaitPolicy, mut check: F) -> Result<(), WaitError>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let mut attempt = 0u32;
    loop {
        if check() {
            return Ok(());
        }
        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            return Err(WaitError::Timeout(policy.timeout, what.to_string()));
        }
        let delay = policy.delay(attempt).min(policy.timeout - elapsed);
        tracing::debug!(target: "expgrid.wait", "{} not ready, next check in {:?}", what, delay);
        tokio::time::sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }
}

pub async fn wait_for_sentinel(path: &Path, policy: &WaitPolicy) -> Result<(), WaitError> {
    let what = path.display().to_string();
    wait_until(&what, policy, || sentinel_exists(path)).await
}
