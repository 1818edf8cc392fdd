use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::assets::decode::{load_image, save_png};
use crate::compose::stitch_grid;
use crate::layout::{ExclusionFilter, list_data_files, output_dir_for};
use crate::sequence::naming::NamingRule;
use crate::sequence::{SequenceEvent, SequenceWarning};
use crate::{GridShape, MergeResult, PixelArray};

/// Options for a grid-mode run.
#[derive(Clone, Debug, Default)]
pub struct GridOptions {
    /// Tiles per composite.
    pub shape: GridShape,
    /// Label, boundary and output-name conventions.
    pub naming: NamingRule,
    /// Artifacts to ignore in the input directory.
    pub exclusions: ExclusionFilter,
}

#[derive(Default)]
struct Group {
    label: Option<char>,
    members: Vec<PixelArray>,
    output: String,
}

/// Single-pass scan of a flat image directory, emitting one grid composite per label group.
///
/// Files are visited in sorted order. A file whose stem ends in the rule's first ordinal closes
/// the group being collected. Within a group, files whose label differs from the group's first
/// member are skipped.
pub struct GridSequencer {
    input: PathBuf,
    out_dir: PathBuf,
    opts: GridOptions,
    files: std::vec::IntoIter<String>,
    group: Group,
    pending: VecDeque<MergeResult<SequenceEvent>>,
    finished: bool,
}

impl GridSequencer {
    /// List `input` and prepare `<output_root>/<input name>_out`.
    pub fn new(input: &Path, output_root: &Path, opts: GridOptions) -> MergeResult<Self> {
        opts.shape.validate()?;
        let files = list_data_files(input, &opts.exclusions)?;
        let out_dir = output_dir_for(input, output_root)?;
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("create output dir '{}'", out_dir.display()))?;

        tracing::debug!(
            input = %input.display(),
            files = files.len(),
            columns = opts.shape.columns,
            rows = opts.shape.rows,
            "grid sequencer ready"
        );

        Ok(Self {
            input: input.to_path_buf(),
            out_dir,
            opts,
            files: files.into_iter(),
            group: Group::default(),
            pending: VecDeque::new(),
            finished: false,
        })
    }

    /// Directory composites are written to.
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn visit(&mut self, name: String) {
        let path = self.input.join(&name);
        self.pending.push_back(Ok(SequenceEvent::Visited { path: path.clone() }));
        if let Err(e) = self.step(&name, &path) {
            self.pending.push_back(Err(e));
        }
    }

    fn step(&mut self, name: &str, path: &Path) -> MergeResult<()> {
        let Some(label) = self.opts.naming.label(name) else {
            self.warn(SequenceWarning::MalformedName {
                name: name.to_string(),
            });
            return Ok(());
        };

        if self.opts.naming.starts_group(name) && !self.group.members.is_empty() {
            self.flush()?;
        }

        if self.group.members.is_empty() {
            self.group.label = Some(label);
        }
        if let Some(expected) = self.group.label
            && expected != label
        {
            self.warn(SequenceWarning::LabelMismatch {
                name: name.to_string(),
                expected,
                found: label,
            });
            return Ok(());
        }

        tracing::debug!(file = name, label = %label, "adding to group");
        self.group.output = self.opts.naming.grid_output_name(name);
        self.group.members.push(load_image(path)?);
        Ok(())
    }

    fn flush(&mut self) -> MergeResult<()> {
        let Group {
            mut members,
            output,
            ..
        } = std::mem::take(&mut self.group);

        let cells = self.opts.shape.cell_count();
        if members.len() > cells {
            self.warn(SequenceWarning::GroupTruncated {
                output: output.clone(),
                images: members.len(),
                kept: cells,
            });
            members.truncate(cells);
        }

        let Some(canvas) = stitch_grid(&members, self.opts.shape) else {
            self.warn(SequenceWarning::GridMismatch {
                output,
                images: members.len(),
                expected: cells,
            });
            return Ok(());
        };

        let path = self.out_dir.join(format!("{output}.png"));
        save_png(&canvas, &path)?;
        tracing::info!(
            path = %path.display(),
            members = members.len(),
            width = canvas.width,
            height = canvas.height,
            "wrote grid composite"
        );
        self.pending.push_back(Ok(SequenceEvent::Exported {
            path,
            members: members.len(),
        }));
        Ok(())
    }

    fn finish_scan(&mut self) {
        match self.group.members.len() {
            0 => {}
            1 => {
                let output = std::mem::take(&mut self.group).output;
                self.warn(SequenceWarning::UndersizedGroup { output });
            }
            _ => {
                if let Err(e) = self.flush() {
                    self.pending.push_back(Err(e));
                }
            }
        }
    }

    fn warn(&mut self, warning: SequenceWarning) {
        tracing::warn!(input = %self.input.display(), "{warning}");
        self.pending.push_back(Ok(SequenceEvent::Warning(warning)));
    }
}

impl Iterator for GridSequencer {
    type Item = MergeResult<SequenceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                if item.is_err() {
                    self.finished = true;
                    self.pending.clear();
                }
                return Some(item);
            }
            if self.finished {
                return None;
            }
            match self.files.next() {
                Some(name) => self.visit(name),
                None => {
                    self.finish_scan();
                    self.finished = true;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/grid.rs"]
mod tests;
