//! calyx-batch — Asynchronous batch evaluation of company portfolios.
//!
//! A [`scheduler::BatchScheduler`] accepts a list of companies, runs the
//! scoring engine over them with bounded concurrency, and tracks each job
//! through its lifecycle: pending → running → one of completed, partially
//! completed, failed, or cancelled. Results and per-company errors are
//! retained per job and read back through paginated accessors.

pub mod job;
pub mod scheduler;

pub use job::{
    BatchJob, BatchJobStatus, BatchOptions, BatchProgress, BatchStatistics, BatchUnitError, Page,
};
pub use scheduler::BatchScheduler;
