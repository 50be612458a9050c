//! Batch processing over a slice of voter records.

use std::ops::Range;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use thiserror::Error;
use tracing::{info, warn};
use wahlsim_ai::Stage;
use wahlsim_core::VoterRecord;
use wahlsim_store::{RecordSink, StoreError};

use crate::orchestrator::Orchestrator;

/// Contiguous slice of the source records: `start` inclusive, `end`
/// exclusive. Both ends are clamped to the number of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl IndexRange {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn resolve(&self, len: usize) -> Range<usize> {
        let end = self.end.map_or(len, |e| e.min(len));
        self.start.min(end)..end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    pub id: u64,
    pub stage: Stage,
    pub error: String,
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: Vec<FailedRecord>,
}

/// Conditions that stop the whole batch. Stage failures never do.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to persist record {id}: {source}")]
    Persist {
        id: u64,
        #[source]
        source: StoreError,
    },
}

/// Runs the [`Orchestrator`] over many records, appending each completed
/// result to the sink as soon as it is done.
pub struct BatchRunner {
    orchestrator: Arc<Orchestrator>,
    sink: Arc<dyn RecordSink>,
    concurrency: usize,
}

impl BatchRunner {
    pub fn new(orchestrator: Arc<Orchestrator>, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            orchestrator,
            sink,
            concurrency: 1,
        }
    }

    /// Records in flight at once. 1 (the default) processes strictly in
    /// source order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Process `voters[range]`. Record ids are the 1-based position in
    /// `voters`, so a sliced run keeps the ids of a full one.
    ///
    /// `on_progress` is called once per finished record, completed or
    /// failed.
    pub async fn run<F>(
        &self,
        voters: &[VoterRecord],
        range: IndexRange,
        mut on_progress: F,
    ) -> Result<BatchSummary, BatchError>
    where
        F: FnMut(Progress),
    {
        let span = range.resolve(voters.len());
        let first = span.start;
        let total = span.len();
        info!(
            total,
            start = span.start,
            end = span.end,
            concurrency = self.concurrency,
            "batch started"
        );

        let orchestrator = self.orchestrator.as_ref();
        let mut runs = stream::iter(voters[span].iter().enumerate())
            .map(|(offset, voter)| orchestrator.run((first + offset + 1) as u64, voter))
            .buffer_unordered(self.concurrency);

        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        let mut processed = 0;
        while let Some(run) = runs.next().await {
            match run.outcome {
                Ok(record) => {
                    self.sink
                        .append(&record)
                        .await
                        .map_err(|source| BatchError::Persist { id: run.id, source })?;
                    summary.completed += 1;
                }
                Err(failure) => {
                    warn!(record_id = run.id, stage = %failure.stage, "record skipped");
                    summary.failed.push(FailedRecord {
                        id: run.id,
                        stage: failure.stage,
                        error: failure.error.to_string(),
                    });
                }
            }
            processed += 1;
            on_progress(Progress { processed, total });
        }

        info!(
            total,
            completed = summary.completed,
            failed = summary.failed.len(),
            "batch finished"
        );
        Ok(summary)
    }
}
