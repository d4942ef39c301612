//! Wait-for-completion poller
//!
//! Repeatedly queries the running-jobs list until the target job disappears
//! from it. Malformed or non-success responses are soft failures: they count
//! toward a fixed retry budget instead of aborting immediately, and the
//! deadline keeps running while they accumulate.

use std::time::{Duration, Instant};

use optrun_client::{ClientError, ExperimentApi};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::output::print_response;

/// Soft failures tolerated before the wait is abandoned
pub const MAX_SOFT_FAILURES: u32 = 3;

/// Ceiling applied when the caller asks to wait "forever"
pub const UNBOUNDED_WAIT: Duration = Duration::from_secs(86_400);

/// How long to wait and how often to poll
#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Total wait budget; `None` waits up to [`UNBOUNDED_WAIT`]
    pub max_wait: Option<Duration>,
    /// Sleep between polls
    pub poll_interval: Duration,
}

impl WaitOptions {
    /// Builds options from the CLI's minute-based flags
    ///
    /// A negative `max_wait_minutes` means an effectively unbounded wait.
    pub fn from_minutes(max_wait_minutes: i64, poll_interval_minutes: u64) -> Self {
        let max_wait = if max_wait_minutes < 0 {
            None
        } else {
            Some(Duration::from_secs(max_wait_minutes as u64 * 60))
        };
        Self {
            max_wait,
            poll_interval: Duration::from_secs(poll_interval_minutes * 60),
        }
    }
}

/// Ways the wait can fail
///
/// Budget exhaustion and deadline expiry are distinguishable; both abort the
/// loop. Transport errors propagate unchanged.
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("failed to wait for job {job_id}: too many failed calls/responses to the service")]
    TooManyFailedCalls { job_id: String },

    #[error("failed to wait for job {job_id}: reached maximum timeout")]
    Timeout { job_id: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Waits until `job_id` is no longer in the running-jobs list
///
/// Polls with the configured interval until the job disappears (success),
/// the soft-failure budget is spent, or the deadline passes.
pub async fn wait_for_job(
    api: &dyn ExperimentApi,
    job_id: &str,
    options: WaitOptions,
) -> Result<(), WaitError> {
    let budget = options.max_wait.unwrap_or(UNBOUNDED_WAIT);
    let deadline = Instant::now() + budget;
    let mut soft_failures = 0u32;

    while Instant::now() < deadline && soft_failures < MAX_SOFT_FAILURES {
        println!(
            "Job running, going to sleep for {:?} before the next check...",
            options.poll_interval
        );
        tokio::time::sleep(options.poll_interval).await;

        let response = api.running_experiments().await?;

        if !response.is_ok() {
            soft_failures += 1;
            warn!(
                status = response.status_code,
                soft_failures, "expected running jobs response to be ok"
            );
            print_response(&response);
            continue;
        }
        let Some(running) = response.body_array() else {
            soft_failures += 1;
            warn!(soft_failures, "expected running jobs response to be a list");
            print_response(&response);
            continue;
        };

        let still_running = running
            .iter()
            .any(|record| record.get("job_id").and_then(Value::as_str) == Some(job_id));

        if !still_running {
            println!("Job finished running");
            return Ok(());
        }
    }

    if soft_failures >= MAX_SOFT_FAILURES {
        Err(WaitError::TooManyFailedCalls {
            job_id: job_id.to_string(),
        })
    } else {
        Err(WaitError::Timeout {
            job_id: job_id.to_string(),
        })
    }
}
