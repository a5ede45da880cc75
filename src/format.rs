//! Model format detection and header dispatch
//!
//! ## Supported Formats
//!
//! | Format | Magic | Extension |
//! |--------|-------|-----------|
//! | GGUF   | `GGUF` | `.gguf` |
//! | SafeTensors | (u64 header size) | `.safetensors` |
//!
//! Files are classified by extension when the file list is built. Before a
//! header is decoded, the first bytes of the file must agree with that
//! extension.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{ExplorerError, Result};
use crate::record::{MetadataEntry, TensorRecord};

/// Detected model format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    /// SafeTensors format (HuggingFace compatible)
    SafeTensors,
    /// GGUF format (llama.cpp compatible)
    Gguf,
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SafeTensors => write!(f, "SafeTensors"),
            Self::Gguf => write!(f, "GGUF"),
        }
    }
}

/// Errors during format detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Data too short for format detection (need at least 8 bytes)
    TooShort {
        /// Actual length
        len: usize,
    },
    /// Unknown format (no magic bytes matched)
    UnknownFormat,
    /// SafeTensors header too large
    HeaderTooLarge {
        /// Header size in bytes
        size: u64,
    },
    /// File extension doesn't match detected format
    ExtensionMismatch {
        /// Detected format
        detected: ModelFormat,
        /// Extension from filename
        extension: String,
    },
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort { len } => {
                write!(
                    f,
                    "Data too short for format detection: {len} bytes (need 8)"
                )
            },
            Self::UnknownFormat => write!(f, "Unknown model format (no magic bytes matched)"),
            Self::HeaderTooLarge { size } => write!(
                f,
                "SafeTensors header too large: {size} bytes (max {MAX_SAFETENSORS_HEADER})"
            ),
            Self::ExtensionMismatch {
                detected,
                extension,
            } => {
                write!(
                    f,
                    "Extension mismatch: detected {detected} but file has extension .{extension}"
                )
            },
        }
    }
}

impl std::error::Error for FormatError {}

impl From<FormatError> for ExplorerError {
    fn from(err: FormatError) -> Self {
        Self::Format {
            reason: err.to_string(),
        }
    }
}

/// GGUF format magic bytes
pub const GGUF_MAGIC: &[u8; 4] = b"GGUF";

/// Maximum SafeTensors JSON header size
pub const MAX_SAFETENSORS_HEADER: u64 = 100_000_000;

#[inline]
fn try_detect_gguf(data: &[u8]) -> Option<ModelFormat> {
    if data.len() >= 4 && &data[0..4] == GGUF_MAGIC {
        return Some(ModelFormat::Gguf);
    }
    None
}

#[inline]
fn try_detect_safetensors(data: &[u8]) -> std::result::Result<Option<ModelFormat>, FormatError> {
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&data[0..8]);
    let header_size = u64::from_le_bytes(len_bytes);
    if header_size > 0 && header_size < MAX_SAFETENSORS_HEADER {
        return Ok(Some(ModelFormat::SafeTensors));
    }
    if header_size >= MAX_SAFETENSORS_HEADER {
        return Err(FormatError::HeaderTooLarge { size: header_size });
    }
    Ok(None)
}

/// Detect model format from the first bytes of a file
///
/// # Errors
///
/// Returns error if:
/// - Data is too short (<8 bytes)
/// - No known magic bytes detected
/// - SafeTensors header size exceeds [`MAX_SAFETENSORS_HEADER`]
///
/// # Example
///
/// ```
/// use tensor_explorer::format::{detect_format, ModelFormat};
///
/// let gguf_data = b"GGUFxxxxxxxxxxxx";
/// assert_eq!(detect_format(gguf_data).expect("gguf"), ModelFormat::Gguf);
/// ```
pub fn detect_format(data: &[u8]) -> std::result::Result<ModelFormat, FormatError> {
    if data.len() < 8 {
        return Err(FormatError::TooShort { len: data.len() });
    }
    if let Some(format) = try_detect_gguf(data) {
        return Ok(format);
    }
    if let Some(format) = try_detect_safetensors(data)? {
        return Ok(format);
    }
    Err(FormatError::UnknownFormat)
}

/// Detect format from the file extension (case-insensitive)
///
/// # Errors
///
/// Returns `FormatError::UnknownFormat` if the extension is not recognized.
///
/// # Example
///
/// ```
/// use tensor_explorer::format::{detect_format_from_path, ModelFormat};
/// use std::path::Path;
///
/// assert_eq!(
///     detect_format_from_path(Path::new("model.GGUF")).expect("gguf"),
///     ModelFormat::Gguf
/// );
/// ```
pub fn detect_format_from_path(path: &Path) -> std::result::Result<ModelFormat, FormatError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match extension.to_lowercase().as_str() {
        "gguf" => Ok(ModelFormat::Gguf),
        "safetensors" => Ok(ModelFormat::SafeTensors),
        _ => Err(FormatError::UnknownFormat),
    }
}

/// Detect format from data and check it agrees with the extension
///
/// # Errors
///
/// Returns error if the magic bytes are unrecognized or contradict a known
/// extension.
pub fn detect_and_verify_format(
    path: &Path,
    data: &[u8],
) -> std::result::Result<ModelFormat, FormatError> {
    let from_data = detect_format(data)?;
    if let Ok(path_format) = detect_format_from_path(path) {
        if path_format != from_data {
            return Err(FormatError::ExtensionMismatch {
                detected: from_data,
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
    }
    Ok(from_data)
}

/// Everything read from one file's header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedFile {
    /// Tensors, in the order the header lists them
    pub records: Vec<TensorRecord>,
    /// File-level key/value metadata
    pub metadata: Vec<MetadataEntry>,
}

/// A file scheduled for decoding, tagged with its format
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatSource {
    /// File path
    pub path: PathBuf,
    /// Container format
    pub format: ModelFormat,
}

impl FormatSource {
    /// Classify `path` by extension
    ///
    /// # Errors
    ///
    /// Returns `ExplorerError::Format` for unsupported extensions.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = detect_format_from_path(&path)?;
        Ok(Self { path, format })
    }

    /// Read tensor and metadata records from the file header
    ///
    /// Only the header is touched; tensor payloads are never read.
    ///
    /// # Errors
    ///
    /// Returns `ExplorerError::Decode` if the file cannot be mapped, its
    /// leading bytes contradict its extension, or its header is malformed.
    pub fn decode(&self) -> Result<DecodedFile> {
        self.verify_prefix().map_err(|e| e.at_path(&self.path))?;
        match self.format {
            ModelFormat::SafeTensors => crate::safetensors::read_file(&self.path),
            ModelFormat::Gguf => crate::gguf::read_file(&self.path),
        }
    }

    fn verify_prefix(&self) -> Result<()> {
        let file = std::fs::File::open(&self.path).map_err(|e| ExplorerError::Io {
            message: format!("Failed to open file '{}': {}", self.path.display(), e),
        })?;
        let mut prefix = Vec::with_capacity(8);
        file.take(8).read_to_end(&mut prefix)?;
        let detected = detect_and_verify_format(&self.path, &prefix)?;
        if detected != self.format {
            return Err(FormatError::ExtensionMismatch {
                detected,
                extension: self.format.to_string().to_lowercase(),
            }
            .into());
        }
        Ok(())
    }
}
