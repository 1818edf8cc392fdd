//! JSON batch files.
//!
//! ```json
//! {
//!   "threads": 2,
//!   "jobs": [
//!     { "input": "plates/A", "output": "merged", "grid": { "columns": 3, "rows": 2 } },
//!     { "input": "series/worm7", "output": "merged", "format": "mp4", "framerate": 12 }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the batch file. Omitted fields take
//! the same defaults as the `merge` command.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::batch::{MergeJob, ModeSelection};
use crate::layout::ExclusionFilter;
use crate::sequence::NamingRule;
use crate::{AnimationFormat, GridShape, MergeError, MergeResult};

/// One job entry of a batch file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    /// Input directory.
    pub input: PathBuf,
    /// Output root.
    pub output: PathBuf,
    /// Requested mode.
    #[serde(default)]
    pub mode: ModeSelection,
    /// Grid shape for grid mode.
    #[serde(default)]
    pub grid: GridShape,
    /// Framerate for stack mode.
    #[serde(default = "default_framerate")]
    pub framerate: u32,
    /// Animation container for stack mode.
    #[serde(default)]
    pub format: AnimationFormat,
    /// File-name conventions.
    #[serde(default)]
    pub naming: NamingRule,
    /// Artifact name fragments to ignore.
    #[serde(default)]
    pub exclusions: ExclusionFilter,
}

fn default_framerate() -> u32 {
    7
}

/// A parsed batch file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFile {
    /// Worker count; defaults to half the logical CPUs.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Jobs in submission order.
    pub jobs: Vec<JobSpec>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl BatchFile {
    /// Parse a batch file from a JSON string. Relative paths resolve against `base_dir`.
    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> MergeResult<Self> {
        let mut file: Self = serde_json::from_str(json)
            .map_err(|e| MergeError::validation(format!("invalid batch file: {e}")))?;
        file.base_dir = base_dir.into();
        Ok(file)
    }

    /// Validate every entry and turn it into a [`MergeJob`].
    pub fn into_jobs(self) -> MergeResult<Vec<MergeJob>> {
        if self.threads == Some(0) {
            return Err(MergeError::validation("batch 'threads' must be >= 1 when set"));
        }
        let base = self.base_dir;
        self.jobs
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| {
                if spec.grid.cell_count() == 0 {
                    return Err(MergeError::validation(format!(
                        "job {idx}: grid dimensions must be non-zero"
                    )));
                }
                if spec.framerate == 0 {
                    return Err(MergeError::validation(format!(
                        "job {idx}: framerate must be non-zero"
                    )));
                }
                Ok(MergeJob {
                    input: base.join(spec.input),
                    output: base.join(spec.output),
                    mode: spec.mode,
                    grid: spec.grid,
                    framerate: spec.framerate,
                    format: spec.format,
                    naming: spec.naming,
                    exclusions: spec.exclusions,
                })
            })
            .collect()
    }
}

/// Read and parse the batch file at `path`.
pub fn load_batch_file(path: &Path) -> MergeResult<BatchFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read batch file '{}'", path.display()))?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    BatchFile::from_json(&json, base_dir)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
