//! Error types for mask merging operations

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::services::io::PairRole;

/// Result type alias for mask merging operations
pub type Result<T> = std::result::Result<T, MergeError>;

/// Error types for mask merging operations
///
/// Only [`MergeError::OutputDirectory`] and [`MergeError::ImageDirectory`] abort a
/// batch. Load, dimension and save errors are contained per item and surface as
/// batch events.
#[derive(Error, Debug)]
pub enum MergeError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output directory could not be created
    #[error("Failed to create output directory '{}': {source}", .path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image directory could not be enumerated
    #[error("Failed to read image directory '{}': {source}", .path.display())]
    ImageDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An image or its mask failed to decode
    #[error("Failed to load {role} '{}': {source}", .path.display())]
    Load {
        role: PairRole,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image and mask sizes differ
    #[error(
        "Image is {}x{} but mask is {}x{}",
        .image.0,
        .image.1,
        .mask.0,
        .mask.1
    )]
    DimensionMismatch { image: (u32, u32), mask: (u32, u32) },

    /// The composite could not be written
    #[error("Failed to save '{}': {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A batch is already running
    #[error("Process already running")]
    AlreadyRunning,

    /// Settings could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MergeError {
    /// Create a new settings error
    pub fn settings<S: Into<String>>(msg: S) -> Self {
        Self::Settings(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Whether this error aborts a whole batch rather than a single item
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::OutputDirectory { .. } | Self::ImageDirectory { .. } | Self::Internal(_)
        )
    }
}
