//! Asynchronous bulk operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Magento's numeric status of a single bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BulkOperationStatus {
    /// The operation was applied.
    Complete,
    /// The operation failed and may succeed if retried.
    RetriablyFailed,
    /// The operation failed permanently.
    NotRetriablyFailed,
    /// The operation is queued or running.
    Open,
    /// The consumer refused the operation.
    Rejected,
}

/// A status code outside Magento's known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown bulk operation status code {0}")]
pub struct UnknownBulkStatus(pub u8);

impl BulkOperationStatus {
    /// Returns the Magento wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Complete => 1,
            Self::RetriablyFailed => 2,
            Self::NotRetriablyFailed => 3,
            Self::Open => 4,
            Self::Rejected => 5,
        }
    }

    /// Returns whether the operation ended unsuccessfully.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::RetriablyFailed | Self::NotRetriablyFailed | Self::Rejected
        )
    }
}

impl TryFrom<u8> for BulkOperationStatus {
    type Error = UnknownBulkStatus;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Complete),
            2 => Ok(Self::RetriablyFailed),
            3 => Ok(Self::NotRetriablyFailed),
            4 => Ok(Self::Open),
            5 => Ok(Self::Rejected),
            other => Err(UnknownBulkStatus(other)),
        }
    }
}

impl From<BulkOperationStatus> for u8 {
    fn from(status: BulkOperationStatus) -> Self {
        status.code()
    }
}

/// One operation inside a bulk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOperation {
    /// Position of the operation within its bulk.
    pub id: u64,
    /// Current status.
    pub status: BulkOperationStatus,
    /// Consumer message, set for failures.
    #[serde(default)]
    pub result_message: Option<String>,
    /// Consumer error code, set for failures.
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// Aggregate state of a bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkState {
    /// At least one operation has not finished, or none are scheduled yet.
    Pending,
    /// Every operation finished and at least one did not succeed.
    Failed,
    /// Every operation succeeded.
    Completed,
}

/// Detailed status of a submitted bulk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSummary {
    /// Bulk identifier returned on submission.
    pub bulk_uuid: String,
    /// Operation statuses, in submission order.
    pub operations: Vec<BulkOperation>,
}

impl BulkSummary {
    /// Derives the aggregate state from the operations.
    #[must_use]
    pub fn state(&self) -> BulkState {
        if self.operations.is_empty()
            || self
                .operations
                .iter()
                .any(|operation| operation.status == BulkOperationStatus::Open)
        {
            return BulkState::Pending;
        }
        if self
            .operations
            .iter()
            .any(|operation| operation.status.is_failure())
        {
            return BulkState::Failed;
        }
        BulkState::Completed
    }

    /// Describes each unsuccessful operation.
    #[must_use]
    pub fn failure_messages(&self) -> Vec<String> {
        self.operations
            .iter()
            .filter(|operation| operation.status.is_failure())
            .map(|operation| {
                let message = operation
                    .result_message
                    .as_deref()
                    .unwrap_or("no message");
                format!("operation {}: {message}", operation.id)
            })
            .collect()
    }
}

/// HTTP verb for a bulk submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkMethod {
    /// Create records.
    Post,
    /// Replace records.
    Put,
    /// Remove records.
    Delete,
}

impl BulkMethod {
    /// Returns the HTTP method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for BulkMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A batch of payloads for `/async/bulk/V1/{topic}`.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    /// Endpoint topic, such as `taxRates`.
    pub topic: String,
    /// HTTP verb.
    pub method: BulkMethod,
    /// One JSON payload per operation.
    pub payloads: Vec<Value>,
}

/// Per-item acknowledgement of a bulk submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRequestItem {
    /// Position of the payload within the submission.
    pub id: u64,
    /// Hash Magento computed for the payload.
    #[serde(default)]
    pub data_hash: Option<String>,
    /// Acceptance status, usually `accepted`.
    pub status: String,
}

/// Response to a bulk submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAccepted {
    /// Identifier to poll with.
    pub bulk_uuid: String,
    /// Acknowledgement per payload.
    #[serde(default)]
    pub request_items: Vec<BulkRequestItem>,
    /// Whether any payload was refused at submission time.
    #[serde(default)]
    pub errors: bool,
}
