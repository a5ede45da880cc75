//! Safetensors header reader
//!
//! Reads tensor names, dtypes, shapes and sizes from the JSON header of a
//! `.safetensors` file. The file is memory-mapped and only the header bytes
//! are touched.
//!
//! Format specification: <https://github.com/huggingface/safetensors>
//!
//! ## Format Overview
//!
//! ```text
//! Safetensors := HEADER METADATA TENSOR_DATA
//!
//! HEADER := {
//!   metadata_len: u64 (little-endian)
//! }
//!
//! METADATA := JSON {
//!   "__metadata__": { "key": "value", ... },   (optional)
//!   "tensor_name": {
//!     "dtype": "F32" | "F16" | "BF16" | ...,
//!     "shape": [dim1, dim2, ...],
//!     "data_offsets": [start, end]
//!   },
//!   ...
//! }
//! ```

mod index;

use std::path::Path;

use serde::Deserialize;

use crate::error::{ExplorerError, Result};
use crate::format::{DecodedFile, MAX_SAFETENSORS_HEADER};
use crate::record::{MetadataEntry, TensorRecord};

pub use index::{SafetensorsIndex, INDEX_SUFFIX};

/// Key holding file-level string metadata
pub const METADATA_KEY: &str = "__metadata__";

/// JSON tensor metadata (internal)
#[derive(Debug, Deserialize)]
struct TensorMetadata {
    dtype: String,
    shape: Vec<u64>,
    data_offsets: [u64; 2],
}

/// Tensor metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetensorsTensorInfo {
    /// Tensor name
    pub name: String,
    /// Data type as spelled in the header (`F32`, `BF16`, `F8_E4M3`, ...)
    pub dtype: String,
    /// Shape (dimensions)
    pub shape: Vec<u64>,
    /// Data offsets relative to the end of the header, `[start, end)`
    pub data_offsets: [u64; 2],
}

impl SafetensorsTensorInfo {
    /// Stored payload size in bytes
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.data_offsets[1] - self.data_offsets[0]
    }
}

/// Parsed header of one Safetensors file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SafetensorsHeader {
    /// Tensors in header order
    pub tensors: Vec<SafetensorsTensorInfo>,
    /// `__metadata__` entries, `(key, value, value_type)`
    pub metadata: Vec<(String, String, String)>,
    /// Size of length prefix plus JSON header
    pub data_offset: u64,
}

impl SafetensorsHeader {
    /// Parse a header from the start of a file's bytes
    ///
    /// `data` may be the whole file or a prefix that covers the JSON header.
    /// When `file_len` is given, tensor offsets are checked against it.
    ///
    /// # Errors
    ///
    /// Returns `ExplorerError::Format` if:
    /// - Data is shorter than the 8-byte length prefix
    /// - Header length is too large or runs past the data
    /// - JSON is malformed or a tensor entry is invalid
    pub fn from_bytes(data: &[u8], file_len: Option<u64>) -> Result<Self> {
        if data.len() < 8 {
            return Err(malformed(format!(
                "File too small: {} bytes (minimum 8 for header)",
                data.len()
            )));
        }
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&data[0..8]);
        let metadata_len = u64::from_le_bytes(len_bytes);
        if metadata_len > MAX_SAFETENSORS_HEADER {
            return Err(malformed(format!(
                "Header length {metadata_len} exceeds limit {MAX_SAFETENSORS_HEADER}"
            )));
        }

        let metadata_len_usize = usize::try_from(metadata_len).map_err(|_| {
            malformed(format!(
                "Metadata length {metadata_len} exceeds platform limit"
            ))
        })?;
        let data_offset = 8 + metadata_len_usize;
        if data.len() < data_offset {
            return Err(malformed(format!(
                "File truncated: need {} bytes for header+metadata, have {}",
                data_offset,
                data.len()
            )));
        }

        let header = Self::parse_metadata(&data[8..data_offset], 8 + metadata_len)?;

        if let Some(len) = file_len {
            let max_tensor_end = header
                .tensors
                .iter()
                .map(|t| t.data_offsets[1])
                .max()
                .unwrap_or(0);
            let required = header.data_offset.saturating_add(max_tensor_end);
            if len < required {
                return Err(malformed(format!(
                    "File is truncated: {len} bytes but tensor data requires {required} bytes"
                )));
            }
        }

        Ok(header)
    }

    fn parse_metadata(json_bytes: &[u8], data_offset: u64) -> Result<Self> {
        let json_value: serde_json::Value = serde_json::from_slice(json_bytes)
            .map_err(|e| malformed(format!("Invalid header JSON: {e}")))?;
        let json_map = json_value
            .as_object()
            .ok_or_else(|| malformed("Expected JSON object"))?;

        let mut tensors = Vec::with_capacity(json_map.len());
        let mut metadata = Vec::new();
        for (name, value) in json_map {
            if name == METADATA_KEY {
                metadata = parse_string_map(value)?;
                continue;
            }
            // Other reserved keys
            if name.starts_with("__") {
                continue;
            }

            let meta: TensorMetadata = serde_json::from_value(value.clone())
                .map_err(|e| malformed(format!("Failed to parse tensor '{name}': {e}")))?;
            let [start, end] = meta.data_offsets;
            if end < start {
                return Err(malformed(format!(
                    "Tensor '{name}' has inverted data offsets [{start}, {end}]"
                )));
            }
            tensors.push(SafetensorsTensorInfo {
                name: name.clone(),
                dtype: meta.dtype,
                shape: meta.shape,
                data_offsets: meta.data_offsets,
            });
        }

        Ok(Self {
            tensors,
            metadata,
            data_offset,
        })
    }

    /// Convert into format-agnostic records
    #[must_use]
    pub fn into_decoded(self, source: &Path) -> DecodedFile {
        let records = self
            .tensors
            .into_iter()
            .map(|t| {
                let byte_size = t.byte_size();
                TensorRecord::new(t.name, t.dtype, t.shape, byte_size).with_source(source)
            })
            .collect();
        let metadata = self
            .metadata
            .into_iter()
            .map(|(key, value, value_type)| {
                MetadataEntry::new(key, &value, value_type).with_source(source)
            })
            .collect();
        DecodedFile { records, metadata }
    }
}

fn parse_string_map(value: &serde_json::Value) -> Result<Vec<(String, String, String)>> {
    let map = value
        .as_object()
        .ok_or_else(|| malformed(format!("'{METADATA_KEY}' must be a JSON object")))?;
    Ok(map
        .iter()
        .map(|(k, v)| {
            let (text, kind) = match v {
                serde_json::Value::String(s) => (s.clone(), "string"),
                serde_json::Value::Number(_) => (v.to_string(), "number"),
                serde_json::Value::Bool(_) => (v.to_string(), "bool"),
                serde_json::Value::Null => (v.to_string(), "null"),
                serde_json::Value::Array(_) => (v.to_string(), "array"),
                serde_json::Value::Object(_) => (v.to_string(), "object"),
            };
            (k.clone(), text, kind.to_string())
        })
        .collect())
}

fn malformed(reason: impl Into<String>) -> ExplorerError {
    ExplorerError::Format {
        reason: reason.into(),
    }
}

/// Memory-mapped view of a Safetensors file's header
///
/// The mapping is held only while the header is parsed; tensor data pages
/// are never faulted in.
#[derive(Debug)]
pub struct MappedSafetensors {
    mmap: memmap2::Mmap,
    path: std::path::PathBuf,
}

impl MappedSafetensors {
    /// Map a file read-only
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::open(&path).map_err(|e| ExplorerError::Io {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

        // SAFETY: File is opened read-only and we don't modify it
        let mmap = unsafe {
            memmap2::MmapOptions::new()
                .map(&file)
                .map_err(|e| ExplorerError::Io {
                    message: format!("Failed to mmap file '{}': {}", path.display(), e),
                })?
        };
        Ok(Self { mmap, path })
    }

    /// Parse the header
    ///
    /// # Errors
    ///
    /// Returns `ExplorerError::Format` for malformed headers.
    pub fn header(&self) -> Result<SafetensorsHeader> {
        SafetensorsHeader::from_bytes(&self.mmap, Some(self.mmap.len() as u64))
    }

    /// Mapped file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Decode a `.safetensors` file's header into records
///
/// # Errors
///
/// Returns `ExplorerError::Decode` naming `path` on any failure.
pub fn read_file(path: &Path) -> Result<DecodedFile> {
    let decode = || -> Result<DecodedFile> {
        let mapped = MappedSafetensors::open(path)?;
        Ok(mapped.header()?.into_decoded(mapped.path()))
    };
    decode().map_err(|e| e.at_path(path))
}
