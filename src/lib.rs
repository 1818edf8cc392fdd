//! Roboworm merge turns directories of microscopy images into composites.
//!
//! Two input layouts are recognized:
//!
//! - A flat directory of images named by well and ordinal is merged into grid composites, one PNG
//!   per label group ([`GridSequencer`]).
//! - A directory holding one control file and numbered timepoint subdirectories is merged into one
//!   looping GIF or MP4 per frame name ([`StackSequencer`]).
//!
//! [`classify`] decides which layout a directory has, [`run_job`] runs a single directory and
//! [`BatchRunner`] runs several on a bounded worker pool.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

/// Jobs and the batch worker pool.
pub mod batch;
/// Image compositing primitives.
pub mod compose;
/// Batch file configuration.
pub mod config;
/// Animation encoders.
pub mod encode;
/// Directory layout detection.
pub mod layout;
/// Grid and stack sequencers.
pub mod sequence;

pub use crate::foundation::core::{AnimationFormat, GridShape, PixelArray, WHITE};
pub use crate::foundation::error::{MergeError, MergeResult};

pub use crate::assets::decode::{is_recognized_image, load_image, save_png};
pub use crate::batch::{BatchRunner, JobSummary, JobUpdate, MergeJob, ModeSelection, run_job};
pub use crate::compose::{stitch_grid, stitch_horizontal};
pub use crate::config::{BatchFile, load_batch_file};
pub use crate::encode::encode_animation;
pub use crate::layout::{ExclusionFilter, LayoutKind, classify, require_layout};
pub use crate::sequence::{
    GridOptions, GridSequencer, LabelPosition, NamingRule, SequenceEvent, SequenceStats,
    SequenceWarning, StackOptions, StackSequencer,
};
