//! Error types for tensor-explorer
//!
//! Load-time failures are the only errors this crate produces. Navigation,
//! flattening and search are total functions and never return `Result`.
//!
//! | Variant | Fatal? | Raised by |
//! |---------|--------|-----------|
//! | `PathResolution` | yes | `discover` |
//! | `Decode` | no, the file is skipped | `safetensors`, `gguf` |
//! | `AllFilesFailed` | yes | `loader` |
//! | `Io` | depends on caller | anywhere touching the filesystem |
//! | `Format` | no | `format` detection |
//! | `Terminal` | yes | `tui` |

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for tensor-explorer operations
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Error type for all tensor-explorer operations
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The CLI arguments did not resolve to any loadable file
    #[error("Path resolution failed: {reason}")]
    PathResolution {
        /// Why resolution failed
        reason: String,
    },

    /// One file's header could not be decoded
    #[error("Failed to decode '{}': {reason}", path.display())]
    Decode {
        /// File that failed
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// Every resolved file failed to decode
    #[error("All {count} file(s) failed to load")]
    AllFilesFailed {
        /// Number of files attempted
        count: usize,
    },

    /// Filesystem error
    #[error("I/O error: {message}")]
    Io {
        /// Underlying message
        message: String,
    },

    /// Container format could not be determined or is malformed
    #[error("Format error: {reason}")]
    Format {
        /// What was wrong
        reason: String,
    },

    /// Terminal setup, drawing or teardown failed
    #[error("Terminal error: {message}")]
    Terminal {
        /// Underlying message
        message: String,
    },
}

impl ExplorerError {
    /// Build a `Decode` error for `path`
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attribute a reader error to the file it came from
    ///
    /// `Format` and `Io` errors become `Decode` errors for `path`; other
    /// variants are returned unchanged.
    #[must_use]
    pub fn at_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Format { reason } => Self::Decode {
                path: path.into(),
                reason,
            },
            Self::Io { message } => Self::Decode {
                path: path.into(),
                reason: message,
            },
            other => other,
        }
    }

    /// Whether the process should stop after this error
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Decode { .. } | Self::Format { .. })
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}
