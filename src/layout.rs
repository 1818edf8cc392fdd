//! Directory listing, artifact exclusion, layout classification and progress totals.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::decode::is_recognized_image;
use crate::{MergeError, MergeResult};

/// Case-insensitive name fragments marking non-data artifacts (thumbnails, plate metadata).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ExclusionFilter {
    fragments: Vec<String>,
}

impl ExclusionFilter {
    /// Build a filter from arbitrary fragments.
    pub fn new<S: Into<String>>(fragments: impl IntoIterator<Item = S>) -> Self {
        Self {
            fragments: fragments
                .into_iter()
                .map(|f| f.into().to_lowercase())
                .collect(),
        }
    }

    /// A filter that excludes nothing but dot-files.
    pub fn none() -> Self {
        Self { fragments: vec![] }
    }

    /// Return `true` when `name` is an artifact. Dot-files are always artifacts.
    pub fn is_excluded(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return true;
        }
        let lower = name.to_lowercase();
        self.fragments
            .iter()
            .any(|f| lower.contains(&f.to_lowercase()))
    }
}

impl Default for ExclusionFilter {
    fn default() -> Self {
        Self::new(["thumb", "htd"])
    }
}

/// What a directory looks like to the merger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Flat directory of image files.
    Grid,
    /// One control file plus numbered timepoint subdirectories of images.
    Stack,
    /// Neither; callers must refuse to proceed.
    Unrecognized,
}

struct Entries {
    files: Vec<String>,
    dirs: Vec<String>,
}

fn read_entries(dir: &Path) -> MergeResult<Entries> {
    let rd = std::fs::read_dir(dir).with_context(|| format!("read dir '{}'", dir.display()))?;

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in rd {
        let entry = entry.with_context(|| format!("read dir entry in '{}'", dir.display()))?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::warn!(dir = %dir.display(), "skipping entry with non-UTF-8 name");
            continue;
        };
        let file_type = entry
            .file_type()
            .with_context(|| format!("stat '{}'", entry.path().display()))?;
        if file_type.is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    Ok(Entries { files, dirs })
}

/// Sorted names of the non-artifact files directly inside `dir`.
pub fn list_data_files(dir: &Path, filter: &ExclusionFilter) -> MergeResult<Vec<String>> {
    Ok(read_entries(dir)?
        .files
        .into_iter()
        .filter(|name| !filter.is_excluded(name))
        .collect())
}

/// Lexicographically sorted subdirectories of `dir` (the timepoints of a stack layout).
pub fn list_timepoint_dirs(dir: &Path) -> MergeResult<Vec<PathBuf>> {
    Ok(read_entries(dir)?
        .dirs
        .into_iter()
        .filter(|name| !name.starts_with('.'))
        .map(|name| dir.join(name))
        .collect())
}

fn holds_only_images(dir: &Path, entries: &Entries, filter: &ExclusionFilter) -> bool {
    let data: Vec<&String> = entries
        .files
        .iter()
        .filter(|name| !filter.is_excluded(name))
        .collect();
    !data.is_empty()
        && data
            .iter()
            .all(|name| is_recognized_image(&dir.join(name.as_str())))
}

/// Decide which sequencer applies to `root`.
pub fn classify(root: &Path, filter: &ExclusionFilter) -> MergeResult<LayoutKind> {
    if !root.is_dir() {
        return Ok(LayoutKind::Unrecognized);
    }
    let entries = read_entries(root)?;
    let subdirs: Vec<&String> = entries
        .dirs
        .iter()
        .filter(|d| !d.starts_with('.'))
        .collect();

    if subdirs.is_empty() {
        return Ok(if holds_only_images(root, &entries, filter) {
            LayoutKind::Grid
        } else {
            LayoutKind::Unrecognized
        });
    }

    let control_files = entries.files.iter().filter(|f| !f.starts_with('.')).count();
    if control_files != 1 {
        return Ok(LayoutKind::Unrecognized);
    }

    for name in subdirs {
        if !name.ends_with(|c: char| c.is_ascii_digit()) {
            return Ok(LayoutKind::Unrecognized);
        }
        let sub = root.join(name);
        let sub_entries = read_entries(&sub)?;
        if !sub_entries.dirs.is_empty() || !holds_only_images(&sub, &sub_entries, filter) {
            return Ok(LayoutKind::Unrecognized);
        }
    }

    Ok(LayoutKind::Stack)
}

/// Like [`classify`], but an unrecognized layout is an error.
pub fn require_layout(root: &Path, filter: &ExclusionFilter) -> MergeResult<LayoutKind> {
    match classify(root, filter)? {
        LayoutKind::Unrecognized => Err(MergeError::unrecognized_layout(root)),
        kind => Ok(kind),
    }
}

/// Progress units a grid run over `dir` will yield: one per data file.
pub fn grid_progress_total(dir: &Path, filter: &ExclusionFilter) -> MergeResult<u64> {
    Ok(list_data_files(dir, filter)?.len() as u64)
}

/// Progress units a stack run over `dir` will yield: timepoints × frame keys of the first one.
pub fn stack_progress_total(dir: &Path, filter: &ExclusionFilter) -> MergeResult<u64> {
    let timepoints = list_timepoint_dirs(dir)?;
    let Some(first) = timepoints.first() else {
        return Ok(0);
    };
    let keys = list_data_files(first, filter)?.len() as u64;
    Ok(timepoints.len() as u64 * keys)
}

/// Progress total for `kind`; zero for unrecognized layouts.
pub fn progress_total(kind: LayoutKind, dir: &Path, filter: &ExclusionFilter) -> MergeResult<u64> {
    match kind {
        LayoutKind::Grid => grid_progress_total(dir, filter),
        LayoutKind::Stack => stack_progress_total(dir, filter),
        LayoutKind::Unrecognized => Ok(0),
    }
}

/// `<output_root>/<input dir name>_out`.
pub fn output_dir_for(input: &Path, output_root: &Path) -> MergeResult<PathBuf> {
    let name = match input.file_name() {
        Some(name) => name.to_os_string(),
        None => input
            .canonicalize()
            .with_context(|| format!("resolve input path '{}'", input.display()))?
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| {
                MergeError::validation(format!(
                    "input path '{}' has no directory name",
                    input.display()
                ))
            })?,
    };
    let mut dir_name = name;
    dir_name.push("_out");
    Ok(output_root.join(dir_name))
}

#[cfg(test)]
#[path = "../tests/unit/layout.rs"]
mod tests;
