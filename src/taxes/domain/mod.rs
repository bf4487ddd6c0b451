//! Settings and reports of tax-rate synchronization.

mod report;
mod settings;

pub use report::TaxSyncReport;
pub use settings::{TaxSettingsError, TaxSyncSettings};
