use std::path::PathBuf;
use std::sync::mpsc;

use crate::batch::job::{JobSummary, MergeJob, prepare_job};
use crate::layout::LayoutKind;
use crate::sequence::{SequenceEvent, SequenceWarning};
use crate::{MergeError, MergeResult};

/// Most input directories a single batch accepts.
pub const MAX_BATCH_JOBS: usize = 10;

/// Progress message sent from a worker to the thread driving [`BatchRunner::run`].
///
/// `job` is the index of the job in the slice passed to `run`.
#[derive(Debug)]
pub enum JobUpdate {
    /// The job was classified and is about to run.
    Started {
        /// Job index.
        job: usize,
        /// Detected layout.
        kind: LayoutKind,
        /// Expected number of [`JobUpdate::Progress`] messages.
        total: u64,
    },
    /// One progress unit.
    Progress {
        /// Job index.
        job: usize,
        /// Visited path.
        path: PathBuf,
    },
    /// Input data was dropped.
    Warning {
        /// Job index.
        job: usize,
        /// What was dropped.
        warning: SequenceWarning,
    },
    /// An output file was written.
    Exported {
        /// Job index.
        job: usize,
        /// Written file.
        path: PathBuf,
    },
    /// The job is done. Always the last message for a job.
    Finished {
        /// Job index.
        job: usize,
        /// Summary or the error that ended the job.
        result: MergeResult<JobSummary>,
    },
}

impl JobUpdate {
    /// Index of the job this update belongs to.
    pub fn job(&self) -> usize {
        match self {
            Self::Started { job, .. }
            | Self::Progress { job, .. }
            | Self::Warning { job, .. }
            | Self::Exported { job, .. }
            | Self::Finished { job, .. } => *job,
        }
    }
}

/// Half the logical CPUs, at least one.
pub fn default_worker_count() -> usize {
    (num_cpus::get() / 2).max(1)
}

/// Runs independent merge jobs on a bounded worker pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct BatchRunner {
    threads: Option<usize>,
}

impl BatchRunner {
    /// `threads = None` uses [`default_worker_count`]. The pool never exceeds the job count.
    pub fn new(threads: Option<usize>) -> MergeResult<Self> {
        if threads == Some(0) {
            return Err(MergeError::validation("batch 'threads' must be >= 1 when set"));
        }
        Ok(Self { threads })
    }

    /// Pool size used for `job_count` jobs.
    pub fn worker_count(&self, job_count: usize) -> usize {
        self.threads
            .unwrap_or_else(default_worker_count)
            .min(job_count)
            .max(1)
    }

    /// Run every job and return their results in job order.
    ///
    /// `observer` is called on the calling thread for every [`JobUpdate`], including the final
    /// `Finished` message of each job. A failing job does not stop the others.
    pub fn run(
        &self,
        jobs: &[MergeJob],
        mut observer: impl FnMut(&JobUpdate),
    ) -> MergeResult<Vec<MergeResult<JobSummary>>> {
        if jobs.len() > MAX_BATCH_JOBS {
            return Err(MergeError::validation(format!(
                "a batch holds at most {MAX_BATCH_JOBS} directories, got {}",
                jobs.len()
            )));
        }
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.worker_count(jobs.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("roboworm-worker-{i}"))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build worker pool: {e}"))?;
        tracing::debug!(jobs = jobs.len(), workers, "starting batch");

        let mut results: Vec<Option<MergeResult<JobSummary>>> =
            std::iter::repeat_with(|| None).take(jobs.len()).collect();

        pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel::<JobUpdate>();
            for (idx, job) in jobs.iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| run_reporting(idx, job, &tx));
            }
            drop(tx);

            for update in rx {
                observer(&update);
                if let JobUpdate::Finished { job, result } = update {
                    results[job] = Some(result);
                }
            }
        });

        Ok(results
            .into_iter()
            .enumerate()
            .map(|(idx, result)| {
                result.unwrap_or_else(|| {
                    Err(MergeError::validation(format!(
                        "job {idx} ended without reporting a result"
                    )))
                })
            })
            .collect())
    }
}

fn run_reporting(idx: usize, job: &MergeJob, tx: &mpsc::Sender<JobUpdate>) {
    // A failed send means the receiver is gone; the job still runs to completion.
    let result = prepare_job(job).and_then(|prepared| {
        let _ = tx.send(JobUpdate::Started {
            job: idx,
            kind: prepared.kind(),
            total: prepared.total(),
        });
        prepared.run(|event| {
            let update = match event {
                SequenceEvent::Visited { path } => JobUpdate::Progress {
                    job: idx,
                    path: path.clone(),
                },
                SequenceEvent::Exported { path, .. } => JobUpdate::Exported {
                    job: idx,
                    path: path.clone(),
                },
                SequenceEvent::Warning(warning) => JobUpdate::Warning {
                    job: idx,
                    warning: warning.clone(),
                },
            };
            let _ = tx.send(update);
        })
    });

    if let Err(e) = &result {
        tracing::error!(input = %job.input.display(), error = %e, "job failed");
    }
    let _ = tx.send(JobUpdate::Finished { job: idx, result });
}

#[cfg(test)]
#[path = "../../tests/unit/batch/runner.rs"]
mod tests;
