//! Batched bulk submission with job tracking and status polling.

use crate::magento::{
    domain::{BulkMethod, BulkRequest, BulkState},
    ports::{MagentoBulkSupport, MagentoError},
};
use crate::whippet::{
    domain::{Job, JobId, JobKind, TenantId, WhippetDomainError},
    ports::{JobCommands, WhippetRepositoryError},
};
use mockable::Clock;
use serde_json::Value;
use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(99);
const DEFAULT_MAX_POLLS: NonZeroU32 = NonZeroU32::MIN.saturating_add(29);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Batching and polling limits for [`MagentoBulkCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkCommandOptions {
    /// Maximum payloads per bulk.
    pub batch_size: NonZeroUsize,
    /// Delay between status polls of the same bulk.
    pub poll_interval: Duration,
    /// Status polls per bulk before the batch times out.
    pub max_polls: NonZeroU32,
}

impl Default for BulkCommandOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl BulkCommandOptions {
    /// Builds options from raw limits.
    ///
    /// # Errors
    ///
    /// Returns [`BulkCommandError::InvalidOptions`] when the batch size or
    /// poll budget is zero.
    pub fn new(
        batch_size: usize,
        poll_interval: Duration,
        max_polls: u32,
    ) -> BulkCommandResult<Self> {
        Ok(Self {
            batch_size: NonZeroUsize::new(batch_size)
                .ok_or(BulkCommandError::InvalidOptions("batch size must be at least 1"))?,
            poll_interval,
            max_polls: NonZeroU32::new(max_polls)
                .ok_or(BulkCommandError::InvalidOptions("max polls must be at least 1"))?,
        })
    }

    /// Replaces the batch size, keeping the polling limits.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Final state of one submitted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkOutcome {
    /// Every operation succeeded.
    Completed,
    /// Some operation failed, or the status could not be read.
    Failed,
    /// Operations were still open when the poll budget ran out.
    TimedOut,
}

/// What happened to one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkBatchReport {
    /// Job tracking the batch.
    pub job_id: JobId,
    /// Magento bulk identifier.
    pub bulk_uuid: String,
    /// Number of payloads in the batch.
    pub operations: usize,
    /// Final state.
    pub outcome: BulkOutcome,
    /// Messages of failed operations.
    pub failures: Vec<String>,
}

/// Outcome of a [`MagentoBulkCommand::execute`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkCommandReport {
    /// One entry per submitted batch, in submission order.
    pub batches: Vec<BulkBatchReport>,
}

impl BulkCommandReport {
    /// Returns whether every batch completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.batches
            .iter()
            .all(|batch| batch.outcome == BulkOutcome::Completed)
    }

    /// Returns the number of batches that did not complete.
    #[must_use]
    pub fn failed_batches(&self) -> usize {
        self.batches
            .iter()
            .filter(|batch| batch.outcome != BulkOutcome::Completed)
            .count()
    }
}

/// Errors that abort a bulk command.
#[derive(Debug, Error)]
pub enum BulkCommandError {
    /// Submitting a batch to Magento failed.
    #[error(transparent)]
    Magento(#[from] MagentoError),
    /// Job persistence failed.
    #[error(transparent)]
    Repository(#[from] WhippetRepositoryError),
    /// A job transition was rejected.
    #[error(transparent)]
    Domain(#[from] WhippetDomainError),
    /// Options violate their limits.
    #[error("invalid bulk command options: {0}")]
    InvalidOptions(&'static str),
}

/// Result type for bulk commands.
pub type BulkCommandResult<T> = Result<T, BulkCommandError>;

struct Settlement {
    outcome: BulkOutcome,
    failures: Vec<String>,
}

/// Splits payloads into Magento bulks and tracks each bulk as a job.
#[derive(Clone)]
pub struct MagentoBulkCommand<B, J, C>
where
    B: MagentoBulkSupport,
    J: JobCommands,
    C: Clock + Send + Sync,
{
    bulk: Arc<B>,
    jobs: Arc<J>,
    clock: Arc<C>,
    options: BulkCommandOptions,
}

impl<B, J, C> MagentoBulkCommand<B, J, C>
where
    B: MagentoBulkSupport,
    J: JobCommands,
    C: Clock + Send + Sync,
{
    /// Creates a bulk command.
    #[must_use]
    pub const fn new(
        bulk: Arc<B>,
        jobs: Arc<J>,
        clock: Arc<C>,
        options: BulkCommandOptions,
    ) -> Self {
        Self {
            bulk,
            jobs,
            clock,
            options,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn options(&self) -> BulkCommandOptions {
        self.options
    }

    /// Submits `payloads` in batches and waits for every batch to settle.
    ///
    /// All batches are submitted before any is polled. Empty input submits
    /// nothing and yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns [`BulkCommandError`] when a submission is refused or job
    /// persistence fails. The job of a refused batch is marked failed first,
    /// and batches submitted before it are still polled until they settle so
    /// that none of their jobs is left running.
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        topic: &str,
        method: BulkMethod,
        payloads: &[Value],
    ) -> BulkCommandResult<BulkCommandReport> {
        let mut submitted = Vec::new();
        for chunk in payloads.chunks(self.options.batch_size.get()) {
            let request = BulkRequest {
                topic: topic.to_owned(),
                method,
                payloads: chunk.to_vec(),
            };
            match self.submit(tenant_id, &request).await {
                Ok(batch) => submitted.push(batch),
                Err(err) => {
                    if !submitted.is_empty() {
                        warn!(
                            batches = submitted.len(),
                            "settling submitted bulks after a refused submission"
                        );
                    }
                    self.settle_all(submitted).await?;
                    return Err(err);
                }
            }
        }
        self.settle_all(submitted).await
    }

    async fn settle_all(
        &self,
        submitted: Vec<(Job, String, usize)>,
    ) -> BulkCommandResult<BulkCommandReport> {
        let mut report = BulkCommandReport::default();
        for (mut job, bulk_uuid, operations) in submitted {
            let settlement = self.await_settlement(&bulk_uuid).await;
            self.finish_job(&mut job, &settlement, operations).await?;
            info!(
                job_id = %job.id(),
                bulk_uuid = %bulk_uuid,
                outcome = ?settlement.outcome,
                operations,
                "Magento bulk settled"
            );
            report.batches.push(BulkBatchReport {
                job_id: job.id(),
                bulk_uuid,
                operations,
                outcome: settlement.outcome,
                failures: settlement.failures,
            });
        }
        Ok(report)
    }

    async fn submit(
        &self,
        tenant_id: TenantId,
        request: &BulkRequest,
    ) -> BulkCommandResult<(Job, String, usize)> {
        let mut job = Job::new(tenant_id, JobKind::MagentoBulk, &*self.clock);
        self.jobs.insert(&job).await?;
        match self.bulk.submit_bulk(request).await {
            Ok(accepted) => {
                job.start(Some(accepted.bulk_uuid.clone()), &*self.clock)?;
                self.jobs.update(&job).await?;
                info!(
                    job_id = %job.id(),
                    bulk_uuid = %accepted.bulk_uuid,
                    topic = %request.topic,
                    method = %request.method,
                    operations = request.payloads.len(),
                    "submitted Magento bulk"
                );
                Ok((job, accepted.bulk_uuid, request.payloads.len()))
            }
            Err(err) => {
                warn!(
                    job_id = %job.id(),
                    topic = %request.topic,
                    error = %err,
                    "bulk submission failed"
                );
                job.fail(format!("submission failed: {err}"), &*self.clock)?;
                self.jobs.update(&job).await?;
                Err(err.into())
            }
        }
    }

    async fn await_settlement(&self, bulk_uuid: &str) -> Settlement {
        let max_polls = self.options.max_polls.get();
        for attempt in 1..=max_polls {
            match self.bulk.bulk_status(bulk_uuid).await {
                Ok(summary) => match summary.state() {
                    BulkState::Pending => {}
                    BulkState::Completed => {
                        return Settlement {
                            outcome: BulkOutcome::Completed,
                            failures: Vec::new(),
                        };
                    }
                    BulkState::Failed => {
                        return Settlement {
                            outcome: BulkOutcome::Failed,
                            failures: summary.failure_messages(),
                        };
                    }
                },
                Err(err) => {
                    warn!(bulk_uuid, attempt, error = %err, "bulk status poll failed");
                    return Settlement {
                        outcome: BulkOutcome::Failed,
                        failures: vec![format!("status poll failed: {err}")],
                    };
                }
            }
            if attempt < max_polls {
                tokio::time::sleep(self.options.poll_interval).await;
            }
        }
        warn!(bulk_uuid, max_polls, "bulk still open after poll budget");
        Settlement {
            outcome: BulkOutcome::TimedOut,
            failures: Vec::new(),
        }
    }

    async fn finish_job(
        &self,
        job: &mut Job,
        settlement: &Settlement,
        operations: usize,
    ) -> BulkCommandResult<()> {
        match settlement.outcome {
            BulkOutcome::Completed => {
                job.succeed(Some(format!("{operations} operations completed")), &*self.clock)?;
            }
            BulkOutcome::Failed => job.fail(settlement.failures.join("; "), &*self.clock)?,
            BulkOutcome::TimedOut => job.time_out(&*self.clock)?,
        }
        self.jobs.update(job).await?;
        Ok(())
    }
}
