//! Grid and stack sequencers.
//!
//! Both sequencers are lazy iterators. Each call to `next` does at most one unit of scanning
//! work (one file or one timepoint directory) and yields the events it produced, so a caller can
//! drive a progress indicator by counting [`SequenceEvent::Visited`] items. The first error ends
//! the sequence.

use std::path::PathBuf;

pub(crate) mod grid;
pub(crate) mod naming;
pub(crate) mod stack;

/// Something a sequencer did while scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceEvent {
    /// One progress unit: a file (grid mode) or a timepoint copy of a frame (stack mode).
    Visited {
        /// The path that was visited.
        path: PathBuf,
    },
    /// An output file was written.
    Exported {
        /// Written file.
        path: PathBuf,
        /// Number of source images merged into it.
        members: usize,
    },
    /// Input data was dropped instead of merged.
    Warning(SequenceWarning),
}

/// Data-dropping outcomes. Each one is also logged at warn level when it happens.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SequenceWarning {
    /// A file whose label differs from the current group's label was skipped.
    #[error("'{name}' has label '{found}' but the current group is '{expected}'; skipped")]
    LabelMismatch {
        /// Skipped file name.
        name: String,
        /// Label of the group being collected.
        expected: char,
        /// Label of the skipped file.
        found: char,
    },
    /// A file name too short (or missing the delimiter) to carry a label was skipped.
    #[error("'{name}' does not carry a group label; skipped")]
    MalformedName {
        /// Skipped file name.
        name: String,
    },
    /// A group held more images than the grid has cells; the excess was dropped.
    #[error("group '{output}' holds {images} images, only the first {kept} fit the grid")]
    GroupTruncated {
        /// Output stem of the group.
        output: String,
        /// Images collected.
        images: usize,
        /// Images kept.
        kept: usize,
    },
    /// A group's image count did not match the grid; nothing was written for it.
    #[error("group '{output}' holds {images} images but the grid needs {expected}; not exported")]
    GridMismatch {
        /// Output stem of the group.
        output: String,
        /// Images collected.
        images: usize,
        /// Cells in the grid.
        expected: usize,
    },
    /// The trailing group held a single image and was not flushed.
    #[error("trailing group '{output}' holds a single image; not exported")]
    UndersizedGroup {
        /// Output stem of the group.
        output: String,
    },
    /// A frame present in the first timepoint was absent from a later one.
    #[error("frame '{frame}' is missing from timepoint '{}'", timepoint.display())]
    MissingFrame {
        /// Frame key.
        frame: String,
        /// Timepoint directory lacking the frame.
        timepoint: PathBuf,
    },
}

/// Counters accumulated while draining a sequencer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceStats {
    /// Progress units seen.
    pub visited: u64,
    /// Files written.
    pub exported: u64,
    /// Warnings raised.
    pub warnings: u64,
}

impl SequenceStats {
    /// Account for one event.
    pub fn record(&mut self, event: &SequenceEvent) {
        match event {
            SequenceEvent::Visited { .. } => self.visited += 1,
            SequenceEvent::Exported { .. } => self.exported += 1,
            SequenceEvent::Warning(_) => self.warnings += 1,
        }
    }
}

pub use grid::{GridOptions, GridSequencer};
pub use naming::{LabelPosition, NamingRule};
pub use stack::{StackOptions, StackSequencer};
