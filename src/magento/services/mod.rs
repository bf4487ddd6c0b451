//! Magento application services.

mod bulk_command;

pub use bulk_command::{
    BulkBatchReport, BulkCommandError, BulkCommandOptions, BulkCommandReport, BulkCommandResult,
    BulkOutcome, MagentoBulkCommand,
};
