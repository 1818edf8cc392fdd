use std::path::{Path, PathBuf};

use crate::layout::{ExclusionFilter, LayoutKind, progress_total, require_layout};
use crate::sequence::{
    GridOptions, GridSequencer, NamingRule, SequenceEvent, SequenceStats, StackOptions,
    StackSequencer,
};
use crate::{AnimationFormat, GridShape, MergeError, MergeResult};

/// Which sequencer a job should run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelection {
    /// Pick the sequencer from the detected layout.
    #[default]
    Auto,
    /// Require a flat grid layout.
    Grid,
    /// Require a timepoint stack layout.
    Stack,
}

/// One input directory to merge, with every knob the sequencers take.
#[derive(Clone, Debug)]
pub struct MergeJob {
    /// Input directory.
    pub input: PathBuf,
    /// Output root; results land in `<output>/<input name>_out`.
    pub output: PathBuf,
    /// Requested mode.
    pub mode: ModeSelection,
    /// Grid shape for grid mode.
    pub grid: GridShape,
    /// Animation framerate for stack mode.
    pub framerate: u32,
    /// Animation container for stack mode.
    pub format: AnimationFormat,
    /// File-name conventions.
    pub naming: NamingRule,
    /// Artifacts to ignore.
    pub exclusions: ExclusionFilter,
}

impl MergeJob {
    /// A job with the CLI defaults (auto mode, 2x2 grid, framerate 7, GIF).
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let stack = StackOptions::default();
        Self {
            input: input.into(),
            output: output.into(),
            mode: ModeSelection::Auto,
            grid: GridShape::default(),
            framerate: stack.framerate,
            format: stack.format,
            naming: NamingRule::default(),
            exclusions: ExclusionFilter::default(),
        }
    }

    fn grid_options(&self) -> GridOptions {
        GridOptions {
            shape: self.grid,
            naming: self.naming.clone(),
            exclusions: self.exclusions.clone(),
        }
    }

    fn stack_options(&self) -> StackOptions {
        StackOptions {
            format: self.format,
            framerate: self.framerate,
            naming: self.naming.clone(),
            exclusions: self.exclusions.clone(),
        }
    }
}

/// Outcome of a finished job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobSummary {
    /// Layout the job ran against.
    pub kind: LayoutKind,
    /// Progress units visited.
    pub files_visited: u64,
    /// Files written.
    pub exported: u64,
    /// Warnings raised.
    pub warnings: u64,
}

/// A job whose layout has been classified and whose progress total is known.
#[derive(Debug)]
pub struct PreparedJob<'a> {
    job: &'a MergeJob,
    kind: LayoutKind,
    total: u64,
}

fn require_dir(path: &Path, role: &str) -> MergeResult<()> {
    if !path.is_dir() {
        return Err(MergeError::validation(format!(
            "{role} path '{}' is not an existing directory",
            path.display()
        )));
    }
    Ok(())
}

/// Validate the job's paths, classify its input and check the requested mode against it.
pub fn prepare_job(job: &MergeJob) -> MergeResult<PreparedJob<'_>> {
    require_dir(&job.input, "input")?;
    require_dir(&job.output, "output")?;

    let kind = require_layout(&job.input, &job.exclusions)?;
    match (job.mode, kind) {
        (ModeSelection::Auto, _)
        | (ModeSelection::Grid, LayoutKind::Grid)
        | (ModeSelection::Stack, LayoutKind::Stack) => {}
        (requested, found) => {
            return Err(MergeError::validation(format!(
                "requested {requested:?} mode but '{}' has a {found:?} layout",
                job.input.display()
            )));
        }
    }

    let total = progress_total(kind, &job.input, &job.exclusions)?;
    Ok(PreparedJob { job, kind, total })
}

impl PreparedJob<'_> {
    /// Detected layout.
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Number of [`SequenceEvent::Visited`] events the run will yield.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Drain the matching sequencer, handing every event to `on_event`.
    #[tracing::instrument(skip_all, fields(input = %self.job.input.display(), kind = ?self.kind))]
    pub fn run(self, mut on_event: impl FnMut(&SequenceEvent)) -> MergeResult<JobSummary> {
        let mut stats = SequenceStats::default();
        let mut drain = |events: &mut dyn Iterator<Item = MergeResult<SequenceEvent>>| {
            for event in events {
                let event = event?;
                stats.record(&event);
                on_event(&event);
            }
            MergeResult::Ok(())
        };

        match self.kind {
            LayoutKind::Grid => drain(&mut GridSequencer::new(
                &self.job.input,
                &self.job.output,
                self.job.grid_options(),
            )?)?,
            LayoutKind::Stack => drain(&mut StackSequencer::new(
                &self.job.input,
                &self.job.output,
                self.job.stack_options(),
            )?)?,
            LayoutKind::Unrecognized => {
                return Err(MergeError::unrecognized_layout(&self.job.input));
            }
        }

        tracing::info!(
            visited = stats.visited,
            exported = stats.exported,
            warnings = stats.warnings,
            "job finished"
        );
        Ok(JobSummary {
            kind: self.kind,
            files_visited: stats.visited,
            exported: stats.exported,
            warnings: stats.warnings,
        })
    }
}

/// Prepare and run `job` on the current thread.
pub fn run_job(job: &MergeJob, on_event: impl FnMut(&SequenceEvent)) -> MergeResult<JobSummary> {
    prepare_job(job)?.run(on_event)
}

#[cfg(test)]
#[path = "../../tests/unit/batch/job.rs"]
mod tests;
