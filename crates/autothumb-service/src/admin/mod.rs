//! Bulk thumbnail maintenance used by the administrative commands.

pub mod driver;
pub mod report;
pub mod service;

pub use driver::{DriverOutcome, RegenerationDriver, RunOptions};
pub use report::{FieldStatus, FieldSummary, RecordError, Report};
pub use service::ThumbnailAdmin;
