use std::path::PathBuf;

/// Convenience result type used across the merger.
pub type MergeResult<T> = Result<T, MergeError>;

/// Top-level error taxonomy used by merge APIs.
#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    /// Invalid user-provided options or inputs.
    #[error("validation error: {0}")]
    Validation(String),

    /// The input directory is neither a grid-mode nor a stack-mode layout.
    #[error("unrecognized input layout: '{}'", path.display())]
    UnrecognizedLayout {
        /// The directory that failed classification.
        path: PathBuf,
    },

    /// Errors raised while writing composites or animations.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MergeError {
    /// Build a [`MergeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MergeError::UnrecognizedLayout`] value.
    pub fn unrecognized_layout(path: impl Into<PathBuf>) -> Self {
        Self::UnrecognizedLayout { path: path.into() }
    }

    /// Build a [`MergeError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
