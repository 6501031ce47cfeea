//! Scan jobs: one submitted file and its polled result.

mod poll;
mod scan_job;

pub use poll::PollConfig;
pub use scan_job::ScanJob;
