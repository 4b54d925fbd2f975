use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::report::{IterationFailure, SampleRun, StopReason};

/// Misuse of the sampler, reported before any call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error("requested count must be at least 1")]
    InvalidCount,

    #[error("maximum duration must be greater than zero")]
    InvalidDuration,

    #[error("per-call timeout must be greater than zero")]
    InvalidCallTimeout,
}

/// Runs a read operation repeatedly, one call at a time, inside a fixed time budget.
///
/// Between calls the sampler sleeps for `max_duration / requested_count` (integer
/// nanosecond division). The budget is checked before each call only: a call that is
/// already in flight is never interrupted, so without [`Sampler::with_call_timeout`]
/// one slow call can run past the budget.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    call_timeout: Option<Duration>,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon any single call after `limit`; it is then counted as a failed iteration.
    pub fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    /// Average latency in milliseconds, or `None` when no call succeeded.
    pub async fn run<F, Fut, T, E>(
        &self,
        requested_count: u32,
        operation: F,
        max_duration: Duration,
    ) -> Result<Option<f64>, SamplerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let run = self.sample(requested_count, operation, max_duration).await?;
        Ok(run.average_ms())
    }

    /// Same loop as [`Sampler::run`], returning every sample and failure.
    pub async fn sample<F, Fut, T, E>(
        &self,
        requested_count: u32,
        mut operation: F,
        max_duration: Duration,
    ) -> Result<SampleRun, SamplerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        if requested_count == 0 {
            return Err(SamplerError::InvalidCount);
        }
        if max_duration.is_zero() {
            return Err(SamplerError::InvalidDuration);
        }
        if self.call_timeout.is_some_and(|t| t.is_zero()) {
            return Err(SamplerError::InvalidCallTimeout);
        }

        let started_at = Instant::now();
        let pacing = max_duration / requested_count;

        tracing::info!(
            requested_count,
            max_duration_ms = max_duration.as_millis() as u64,
            pacing_ms = pacing.as_millis() as u64,
            "sampling started"
        );

        let mut response_times_ms = Vec::with_capacity(requested_count.min(4096) as usize);
        let mut failures = Vec::new();
        let mut stop_reason = StopReason::CountExhausted;

        for iteration in 1..=requested_count {
            if started_at.elapsed() >= max_duration {
                stop_reason = StopReason::TimeBoxExpired;
                break;
            }

            let call_start = Instant::now();
            match self.call(&mut operation).await {
                Ok(()) => response_times_ms.push(as_millis(call_start.elapsed())),
                Err(message) => {
                    tracing::warn!(iteration, error = %message, "call failed, no sample recorded");
                    failures.push(IterationFailure { iteration, message });
                }
            }

            if iteration < requested_count {
                tokio::time::sleep(pacing).await;
            }
        }

        let run = SampleRun {
            requested_count,
            max_duration,
            pacing,
            response_times_ms,
            failures,
            stop_reason,
            elapsed: started_at.elapsed(),
        };

        tracing::info!(
            iterations = run.iterations(),
            samples = run.response_times_ms().len(),
            failures = run.failures().len(),
            stop_reason = ?run.stop_reason(),
            elapsed_ms = as_millis(run.elapsed()),
            "sampling finished"
        );
        match run.average_ms() {
            Some(average_ms) => tracing::info!(average_ms, "average response time"),
            None => tracing::warn!("no valid samples collected"),
        }

        Ok(run)
    }

    async fn call<F, Fut, T, E>(&self, operation: &mut F) -> Result<(), String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let fut = operation();
        match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result.map(|_| ()).map_err(|e| e.to_string()),
                Err(_) => Err(format!("call timed out after {} ms", limit.as_millis())),
            },
            None => fut.await.map(|_| ()).map_err(|e| e.to_string()),
        }
    }
}

/// [`Sampler::run`] with default settings.
pub async fn run<F, Fut, T, E>(
    requested_count: u32,
    operation: F,
    max_duration: Duration,
) -> Result<Option<f64>, SamplerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    Sampler::new().run(requested_count, operation, max_duration).await
}

/// [`Sampler::sample`] with default settings.
pub async fn sample<F, Fut, T, E>(
    requested_count: u32,
    operation: F,
    max_duration: Duration,
) -> Result<SampleRun, SamplerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    Sampler::new().sample(requested_count, operation, max_duration).await
}

fn as_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
