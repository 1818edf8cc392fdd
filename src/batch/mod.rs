//! Merge jobs and the bounded worker pool that runs several of them at once.
//!
//! Each job owns its input directory and output subdirectory, so jobs share no state. Workers
//! report through a channel drained on the calling thread, which is where progress is
//! aggregated.

pub(crate) mod job;
pub(crate) mod runner;

pub use job::{JobSummary, MergeJob, ModeSelection, PreparedJob, prepare_job, run_job};
pub use runner::{BatchRunner, JobUpdate, MAX_BATCH_JOBS, default_worker_count};
