//! Drives voter records through the four generation stages and persists the
//! completed results.

pub mod batch;
pub mod orchestrator;

pub use batch::{BatchError, BatchRunner, BatchSummary, FailedRecord, IndexRange, Progress};
pub use orchestrator::{Orchestrator, PipelineState, RecordRun, StageFailure, Transition};
