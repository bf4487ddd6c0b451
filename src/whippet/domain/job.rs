//! Tracked background jobs and their lifecycle state machine.

use super::{JobId, ParseWhippetEnumError, TenantId, WhippetDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of work a job represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// A full MOM-to-Magento tax-rate synchronization run.
    TaxRateSync,
    /// A single Magento asynchronous bulk submission.
    MagentoBulk,
}

impl JobKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaxRateSync => "tax_rate_sync",
            Self::MagentoBulk => "magento_bulk",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobKind {
    type Error = ParseWhippetEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tax_rate_sync" => Ok(Self::TaxRateSync),
            "magento_bulk" => Ok(Self::MagentoBulk),
            _ => Err(ParseWhippetEnumError::new("job kind", value)),
        }
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job recorded but not started.
    Pending,
    /// Job is executing or waiting on an external system.
    Running,
    /// Job finished successfully.
    Succeeded,
    /// Job finished with an error.
    Failed,
    /// Job gave up waiting on an external system.
    TimedOut,
}

impl JobStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    /// Returns whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }

    /// Returns whether `self -> target` is a permitted transition.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Running | Self::Failed)
                | (Self::Running, Self::Succeeded | Self::Failed | Self::TimedOut)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for JobStatus {
    type Error = ParseWhippetEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "timed_out" => Ok(Self::TimedOut),
            _ => Err(ParseWhippetEnumError::new("job status", value)),
        }
    }
}

/// A unit of tracked background work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    tenant_id: TenantId,
    kind: JobKind,
    status: JobStatus,
    external_ref: Option<String>,
    detail: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedJobData {
    /// Persisted job identifier.
    pub id: JobId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Persisted job kind.
    pub kind: JobKind,
    /// Persisted lifecycle state.
    pub status: JobStatus,
    /// External reference such as a Magento bulk UUID.
    pub external_ref: Option<String>,
    /// Free-form outcome detail.
    pub detail: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Creates a pending job.
    #[must_use]
    pub fn new(tenant_id: TenantId, kind: JobKind, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: JobId::new(),
            tenant_id,
            kind,
            status: JobStatus::Pending,
            external_ref: None,
            detail: None,
            created_at: timestamp,
            updated_at: timestamp,
            completed_at: None,
        }
    }

    /// Reconstructs a job from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedJobData) -> Self {
        Self {
            id: data.id,
            tenant_id: data.tenant_id,
            kind: data.kind,
            status: data.status,
            external_ref: data.external_ref,
            detail: data.detail,
            created_at: data.created_at,
            updated_at: data.updated_at,
            completed_at: data.completed_at,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the job kind.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.status
    }

    /// Returns the external reference, if any.
    #[must_use]
    pub fn external_ref(&self) -> Option<&str> {
        self.external_ref.as_deref()
    }

    /// Returns the outcome detail, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the completion timestamp for terminal jobs.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Marks the job as running, optionally recording an external reference.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidJobTransition`] unless the job is
    /// pending.
    pub fn start(
        &mut self,
        external_ref: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), WhippetDomainError> {
        self.transition(JobStatus::Running, clock)?;
        if external_ref.is_some() {
            self.external_ref = external_ref;
        }
        Ok(())
    }

    /// Marks the job as succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidJobTransition`] unless the job is
    /// running.
    pub fn succeed(
        &mut self,
        detail: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), WhippetDomainError> {
        self.finish(JobStatus::Succeeded, detail, clock)
    }

    /// Marks the job as failed.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidJobTransition`] when the job is
    /// already terminal.
    pub fn fail(
        &mut self,
        detail: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), WhippetDomainError> {
        self.finish(JobStatus::Failed, Some(detail.into()), clock)
    }

    /// Marks the job as timed out.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidJobTransition`] unless the job is
    /// running.
    pub fn time_out(&mut self, clock: &impl Clock) -> Result<(), WhippetDomainError> {
        self.finish(JobStatus::TimedOut, None, clock)
    }

    fn finish(
        &mut self,
        target: JobStatus,
        detail: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), WhippetDomainError> {
        self.transition(target, clock)?;
        self.completed_at = Some(self.updated_at);
        if detail.is_some() {
            self.detail = detail;
        }
        Ok(())
    }

    fn transition(
        &mut self,
        target: JobStatus,
        clock: &impl Clock,
    ) -> Result<(), WhippetDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(WhippetDomainError::InvalidJobTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = clock.utc();
        Ok(())
    }
}
