use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::decode::load_image;
use crate::encode::encode_animation;
use crate::layout::{ExclusionFilter, list_data_files, list_timepoint_dirs, output_dir_for};
use crate::sequence::naming::NamingRule;
use crate::sequence::{SequenceEvent, SequenceWarning};
use crate::{AnimationFormat, MergeError, MergeResult, PixelArray};

/// Options for a stack-mode run.
#[derive(Clone, Debug)]
pub struct StackOptions {
    /// Output container.
    pub format: AnimationFormat,
    /// MP4 frames per second; GIF per-frame delay in milliseconds.
    pub framerate: u32,
    /// Output-name conventions.
    pub naming: NamingRule,
    /// Artifacts to ignore inside timepoint directories.
    pub exclusions: ExclusionFilter,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            format: AnimationFormat::Gif,
            framerate: 7,
            naming: NamingRule::default(),
            exclusions: ExclusionFilter::default(),
        }
    }
}

struct Cursor {
    frame: String,
    next_timepoint: usize,
    frames: Vec<PixelArray>,
}

/// Walks sibling timepoint directories and writes one animation per frame key.
///
/// Frame keys come from the first timepoint (sorted). For every key, each timepoint is visited in
/// lexicographic order and its copy of the frame, when present, is appended to the animation.
pub struct StackSequencer {
    out_dir: PathBuf,
    opts: StackOptions,
    timepoints: Vec<PathBuf>,
    contents: Vec<BTreeSet<String>>,
    keys: std::vec::IntoIter<String>,
    cursor: Option<Cursor>,
    pending: VecDeque<MergeResult<SequenceEvent>>,
    finished: bool,
}

impl StackSequencer {
    /// List the timepoints of `input` and prepare `<output_root>/<input name>_out`.
    pub fn new(input: &Path, output_root: &Path, opts: StackOptions) -> MergeResult<Self> {
        if opts.framerate == 0 {
            return Err(MergeError::validation("framerate must be non-zero"));
        }

        let timepoints = list_timepoint_dirs(input)?;
        let Some(first) = timepoints.first() else {
            return Err(MergeError::validation(format!(
                "'{}' has no timepoint directories",
                input.display()
            )));
        };
        let keys = list_data_files(first, &opts.exclusions)?;

        let contents = timepoints
            .iter()
            .map(|dir| {
                list_data_files(dir, &opts.exclusions).map(|names| names.into_iter().collect())
            })
            .collect::<MergeResult<Vec<BTreeSet<String>>>>()?;

        let out_dir = output_dir_for(input, output_root)?;
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

        tracing::debug!(
            input = %input.display(),
            timepoints = timepoints.len(),
            frames = keys.len(),
            format = opts.format.extension(),
            "stack sequencer ready"
        );

        Ok(Self {
            out_dir,
            opts,
            timepoints,
            contents,
            keys: keys.into_iter(),
            cursor: None,
            pending: VecDeque::new(),
            finished: false,
        })
    }

    /// Directory animations are written to.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Timepoint directories in visiting order.
    pub fn timepoints(&self) -> &[PathBuf] {
        &self.timepoints
    }

    fn visit(&mut self, mut cursor: Cursor) -> Option<Cursor> {
        let Some(dir) = self.timepoints.get(cursor.next_timepoint) else {
            self.emit(cursor);
            return None;
        };
        let idx = cursor.next_timepoint;
        cursor.next_timepoint += 1;

        let path = dir.join(&cursor.frame);
        self.pending.push_back(Ok(SequenceEvent::Visited { path: path.clone() }));

        if self.contents[idx].contains(&cursor.frame) {
            match load_image(&path) {
                Ok(px) => cursor.frames.push(px),
                Err(e) => {
                    self.pending.push_back(Err(e));
                    return None;
                }
            }
        } else {
            let timepoint = dir.clone();
            self.warn(SequenceWarning::MissingFrame {
                frame: cursor.frame.clone(),
                timepoint,
            });
        }
        Some(cursor)
    }

    fn emit(&mut self, cursor: Cursor) {
        let name = format!(
            "{}.{}",
            self.opts.naming.stack_output_name(&cursor.frame),
            self.opts.format.extension()
        );
        let path = self.out_dir.join(name);
        match encode_animation(&cursor.frames, self.opts.format, self.opts.framerate, &path) {
            Ok(()) => {
                tracing::info!(
                    path = %path.display(),
                    frames = cursor.frames.len(),
                    "wrote animation"
                );
                self.pending.push_back(Ok(SequenceEvent::Exported {
                    path,
                    members: cursor.frames.len(),
                }));
            }
            Err(e) => self.pending.push_back(Err(e)),
        }
    }

    fn warn(&mut self, warning: SequenceWarning) {
        tracing::warn!(out_dir = %self.out_dir.display(), "{warning}");
        self.pending.push_back(Ok(SequenceEvent::Warning(warning)));
    }
}

impl Iterator for StackSequencer {
    type Item = MergeResult<SequenceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                if item.is_err() {
                    self.finished = true;
                    self.cursor = None;
                    self.pending.clear();
                }
                return Some(item);
            }
            if self.finished {
                return None;
            }

            let cursor = match self.cursor.take() {
                Some(cursor) => cursor,
                None => match self.keys.next() {
                    Some(frame) => Cursor {
                        frame,
                        next_timepoint: 0,
                        frames: Vec::new(),
                    },
                    None => {
                        self.finished = true;
                        continue;
                    }
                },
            };
            self.cursor = self.visit(cursor);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/stack.rs"]
mod tests;
