use std::time::Duration;

/// Why the sampling loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every requested iteration was attempted.
    CountExhausted,
    /// The time budget ran out before all iterations were attempted.
    TimeBoxExpired,
}

/// A call that did not produce a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationFailure {
    /// 1-based iteration index.
    pub iteration: u32,
    pub message: String,
}

/// A finished sampling run.
#[derive(Debug, Clone)]
pub struct SampleRun {
    pub(crate) requested_count: u32,
    pub(crate) max_duration: Duration,
    pub(crate) pacing: Duration,
    /// One entry per successful call, in call order.
    pub(crate) response_times_ms: Vec<u64>,
    pub(crate) failures: Vec<IterationFailure>,
    pub(crate) stop_reason: StopReason,
    pub(crate) elapsed: Duration,
}

impl SampleRun {
    pub fn requested_count(&self) -> u32 {
        self.requested_count
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Fixed sleep inserted between iterations.
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    pub fn response_times_ms(&self) -> &[u64] {
        &self.response_times_ms
    }

    pub fn failures(&self) -> &[IterationFailure] {
        &self.failures
    }

    /// Number of calls actually attempted, successful or not.
    pub fn iterations(&self) -> u32 {
        (self.response_times_ms.len() + self.failures.len()) as u32
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// Wall-clock time from run start until the loop exited.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Arithmetic mean of the recorded samples, `None` when nothing succeeded.
    pub fn average_ms(&self) -> Option<f64> {
        mean(&self.response_times_ms)
    }
}

fn mean(data: &[u64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let sum: u128 = data.iter().map(|&v| v as u128).sum();
    Some(sum as f64 / data.len() as f64)
}
