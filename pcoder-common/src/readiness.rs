//! Fixed-interval retry with an overall deadline.
//!
//! VM boot time dominates and is roughly constant, so the probe loop sleeps a
//! fixed interval between attempts instead of backing off.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

/// Delay between probe attempts.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(2);

/// How a probe loop is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl ReadinessPolicy {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: PROBE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyReport {
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadinessError<E> {
    #[error("not ready after {attempts} attempts in {elapsed:?} (timeout {timeout:?})")]
    TimedOut {
        attempts: u32,
        elapsed: Duration,
        timeout: Duration,
    },
    /// The probe itself could not run (as opposed to reporting "not ready").
    #[error("probe failed: {0}")]
    Probe(E),
}

/// Call `probe` until it reports ready or `policy.timeout` elapses.
///
/// `Ok(false)` means "not yet" and is retried after `policy.interval`; an
/// `Err` aborts the wait immediately. No attempt starts once the deadline has
/// passed.
pub async fn wait_until_ready<F, Fut, E>(
    target: &str,
    policy: ReadinessPolicy,
    mut probe: F,
) -> Result<ReadyReport, ReadinessError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    let started = Instant::now();
    let mut attempts = 0;

    while started.elapsed() < policy.timeout {
        attempts += 1;
        debug!(endpoint = target, attempt = attempts, "Probing readiness");

        if probe(attempts).await.map_err(ReadinessError::Probe)? {
            let elapsed = started.elapsed();
            info!(
                endpoint = target,
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                "Target ready"
            );
            return Ok(ReadyReport { attempts, elapsed });
        }

        sleep(policy.interval).await;
    }

    Err(ReadinessError::TimedOut {
        attempts,
        elapsed: started.elapsed(),
        timeout: policy.timeout,
    })
}
