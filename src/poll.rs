use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::delay::delay;
use crate::error::{KieError, Result};
use crate::types::{PollConfig, PollStep, StepState};

// Deadline used when `timeout` is too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Invoke `check` until it yields a definitive result.
///
/// Loop cadence is check, sleep `interval`, check, ... The deadline is
/// tested before every check (including the first) and also bounds each
/// check and each sleep, so a slow check cannot hold the caller past
/// `timeout`.
///
/// - [`StepState::Ready`] ends polling with the value.
/// - [`StepState::Failed`] ends polling with [`KieError::TaskFailed`].
/// - An `Err` from `check` is transient: it is logged and polling continues.
///
/// Any status text on a step is passed to `on_progress` before the step is
/// acted on.
///
/// # Errors
///
/// [`KieError::Timeout`] once `timeout` has elapsed, [`KieError::TaskFailed`]
/// on an explicit failure step, [`KieError::Config`] for a zero interval.
pub async fn poll_until_ready<T, E, F, Fut, P>(
    config: &PollConfig,
    mut check: F,
    mut on_progress: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<PollStep<T>, E>>,
    E: Display,
    P: FnMut(&str),
{
    if config.interval.is_zero() {
        return Err(KieError::Config("poll interval must be non-zero".into()));
    }

    let timed_out = || KieError::Timeout {
        timeout: config.timeout,
    };
    let start = Instant::now();
    let deadline = start
        .checked_add(config.timeout)
        .unwrap_or_else(|| start + FAR_FUTURE);
    let mut checks: u32 = 0;
    loop {
        if Instant::now() >= deadline {
            return Err(timed_out());
        }

        checks += 1;
        let outcome = match tokio::time::timeout_at(deadline, check()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(check = checks, "Status check still running at deadline");
                return Err(timed_out());
            }
        };
        match outcome {
            Ok(step) => {
                if let Some(status) = step.status.as_deref() {
                    on_progress(status);
                }
                match step.state {
                    StepState::Ready(value) => return Ok(value),
                    StepState::Failed(message) => return Err(KieError::TaskFailed(message)),
                    StepState::Pending => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, check = checks, "Polling error, continuing");
            }
        }

        delay(config.interval.min(deadline.saturating_duration_since(Instant::now()))).await;
    }
}
