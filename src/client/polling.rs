//! Polling of asynchronous operations.
//!
//! The poller fetches the operation status until it is terminal, the
//! timeout elapses or the wait is cancelled. The delay between polls grows
//! by `multiplier` up to `max_interval`; a multiplier of 1.0 gives a fixed
//! interval.

use crate::config::{self, Settings};
use crate::error::{Error, Result};
use crate::models::{Operation, OperationStatus};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            interval: Duration::from_secs(config::DEFAULT_POLL_INTERVAL_SECS),
            max_interval: Duration::from_secs(config::DEFAULT_POLL_MAX_INTERVAL_SECS),
            multiplier: config::DEFAULT_POLL_MULTIPLIER,
            timeout: Duration::from_secs(config::DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

impl PollOptions {
    /// Fixed-interval polling.
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        PollOptions {
            interval,
            max_interval: interval,
            multiplier: 1.0,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        PollOptions {
            interval: settings.poll_interval,
            max_interval: settings.poll_max_interval,
            timeout: settings.operation_timeout,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay following `current`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        if self.multiplier <= 1.0 {
            return current.min(self.max_interval.max(self.interval));
        }
        let next = current.as_secs_f64() * self.multiplier;
        match Duration::try_from_secs_f64(next) {
            Ok(next) => next.min(self.max_interval),
            Err(_) => self.max_interval,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::invalid_argument("Poll interval must be positive"));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(Error::invalid_argument("Poll multiplier must be >= 1.0"));
        }
        Ok(())
    }
}

/// Poll `fetch` until operation `operation_id` reaches a terminal state.
///
/// # Returns
/// * `Ok(Operation)` - the operation succeeded
/// * `Err(Error::OperationFailed)` - the operation reported `Failed`
/// * `Err(Error::Timeout)` - still in progress when `timeout` elapsed
/// * `Err(Error::InvalidOperation)` - the service returned an unknown status
/// * `Err(Error::Cancelled)` - `cancel` fired while waiting
pub async fn poll_operation<F, Fut>(
    operation_id: &str,
    options: &PollOptions,
    cancel: Option<&CancellationToken>,
    mut fetch: F,
) -> Result<Operation>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Operation>>,
{
    if operation_id.trim().is_empty() {
        return Err(Error::invalid_argument("Operation id must not be empty"));
    }
    options.validate()?;

    let started = Instant::now();
    // A timeout past the end of the clock means no deadline.
    let deadline = started.checked_add(options.timeout);
    let mut delay = options.interval;
    let mut polls: u32 = 0;

    loop {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Err(Error::Cancelled(operation_id.to_string()));
        }

        let operation = fetch().await?;
        polls += 1;

        match operation.status() {
            OperationStatus::Succeeded => {
                log::info!(
                    "Operation {operation_id} succeeded after {polls} poll(s) in {:?}",
                    started.elapsed()
                );
                return Ok(operation);
            }
            OperationStatus::Failed => {
                let error = operation.to_error(operation_id);
                log::warn!("Operation {operation_id} failed: {error}");
                return Err(Error::OperationFailed(error));
            }
            OperationStatus::Unknown(status) => {
                log::error!("Operation {operation_id} returned unrecognized status '{status}'");
                return Err(Error::InvalidOperation {
                    operation_id: operation_id.to_string(),
                    status,
                });
            }
            OperationStatus::InProgress => {}
        }

        let now = Instant::now();
        let sleep_for = match deadline {
            Some(deadline) if now >= deadline => {
                log::warn!(
                    "Operation {operation_id} still in progress after {:?}",
                    now - started
                );
                return Err(Error::Timeout {
                    operation_id: operation_id.to_string(),
                    elapsed: now - started,
                });
            }
            Some(deadline) => delay.min(deadline - now),
            None => delay,
        };
        log::info!("Operation {operation_id} in progress, next poll in {sleep_for:?}");

        match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {
                        log::warn!("Wait for operation {operation_id} cancelled");
                        return Err(Error::Cancelled(operation_id.to_string()));
                    }
                    _ = tokio::time::sleep(sleep_for) => {}
                }
            }
            None => tokio::time::sleep(sleep_for).await,
        }

        delay = options.next_delay(delay);
    }
}
