pub mod logging;
pub mod report;
pub mod sampler;

pub use report::{IterationFailure, SampleRun, StopReason};
pub use sampler::{run, sample, Sampler, SamplerError};
