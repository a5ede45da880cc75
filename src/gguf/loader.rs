//! GGUF header parsing
//!
//! Header, metadata key/value pairs and tensor infos. The tensor data
//! section is never read.

use std::io::Cursor;

use tracing::warn;

use super::io::{
    read_bool, read_f32, read_f64, read_i16, read_i32, read_i64, read_i8, read_string, read_u16,
    read_u32, read_u64, read_u8,
};
use super::types::{
    GGUFHeader, GGUFValue, TensorInfo, GGUF_MAGIC, GGUF_VERSION_V2, GGUF_VERSION_V3,
    MAX_ARRAY_DEPTH, MAX_ARRAY_LEN, MAX_DIMS, MAX_METADATA_COUNT, MAX_TENSOR_COUNT,
};
use crate::error::{ExplorerError, Result};
use crate::record::{MetadataEntry, TensorRecord};

/// Parsed GGUF header section
#[derive(Debug, Clone, PartialEq)]
pub struct GGUFModel {
    /// File header
    pub header: GGUFHeader,
    /// Metadata key-value pairs, in file order
    pub metadata: Vec<(String, GGUFValue)>,
    /// Tensor information, in file order
    pub tensors: Vec<TensorInfo>,
}

fn malformed(reason: impl Into<String>) -> ExplorerError {
    ExplorerError::Format {
        reason: reason.into(),
    }
}

impl GGUFModel {
    /// Parse the header section of a GGUF file
    ///
    /// `data` may be the whole file (typically a memory map); parsing stops
    /// at the end of the tensor infos.
    ///
    /// # Errors
    ///
    /// Returns `ExplorerError::Format` if:
    /// - Invalid magic number
    /// - Unsupported version
    /// - Counts, dimensions or array lengths exceed sanity limits
    /// - Data ends early
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let header = Self::parse_header(&mut cursor)?;
        let metadata = Self::parse_metadata(&mut cursor, header.metadata_count)?;
        let tensors = Self::parse_tensor_info(&mut cursor, header.tensor_count)?;
        Ok(Self {
            header,
            metadata,
            tensors,
        })
    }

    fn parse_header(cursor: &mut Cursor<&[u8]>) -> Result<GGUFHeader> {
        let magic = read_u32(cursor)?;
        if magic != GGUF_MAGIC {
            return Err(malformed(format!(
                "Invalid GGUF magic: 0x{magic:08X}, expected 0x{GGUF_MAGIC:08X}"
            )));
        }

        let version = read_u32(cursor)?;
        if version != GGUF_VERSION_V2 && version != GGUF_VERSION_V3 {
            return Err(malformed(format!(
                "Unsupported GGUF version: {version}, only v2 and v3 supported"
            )));
        }

        let tensor_count = read_u64(cursor)?;
        if tensor_count > MAX_TENSOR_COUNT {
            return Err(malformed(format!(
                "tensor_count {tensor_count} exceeds maximum allowed {MAX_TENSOR_COUNT} (corrupted header?)"
            )));
        }

        let metadata_count = read_u64(cursor)?;
        if metadata_count > MAX_METADATA_COUNT {
            return Err(malformed(format!(
                "metadata_count {metadata_count} exceeds maximum allowed {MAX_METADATA_COUNT} (corrupted header?)"
            )));
        }

        Ok(GGUFHeader {
            magic,
            version,
            tensor_count,
            metadata_count,
        })
    }

    fn parse_metadata(cursor: &mut Cursor<&[u8]>, count: u64) -> Result<Vec<(String, GGUFValue)>> {
        let mut metadata = Vec::new();
        for _ in 0..count {
            let key = read_string(cursor)?;
            let value_type = read_u32(cursor)?;
            let value = Self::read_value(cursor, value_type, 0)
                .map_err(|e| malformed(format!("metadata '{key}': {}", reason_of(e))))?;
            metadata.push((key, value));
        }
        Ok(metadata)
    }

    /// `depth` is the number of arrays enclosing this value
    fn read_value(cursor: &mut Cursor<&[u8]>, value_type: u32, depth: usize) -> Result<GGUFValue> {
        match value_type {
            0 => Ok(GGUFValue::UInt8(read_u8(cursor)?)),
            1 => Ok(GGUFValue::Int8(read_i8(cursor)?)),
            2 => Ok(GGUFValue::UInt16(read_u16(cursor)?)),
            3 => Ok(GGUFValue::Int16(read_i16(cursor)?)),
            4 => Ok(GGUFValue::UInt32(read_u32(cursor)?)),
            5 => Ok(GGUFValue::Int32(read_i32(cursor)?)),
            6 => Ok(GGUFValue::Float32(read_f32(cursor)?)),
            7 => Ok(GGUFValue::Bool(read_bool(cursor)?)),
            8 => Ok(GGUFValue::String(read_string(cursor)?)),
            9 => {
                if depth >= MAX_ARRAY_DEPTH {
                    return Err(malformed(format!(
                        "nested array depth {} exceeds maximum {MAX_ARRAY_DEPTH} (corrupted?)",
                        depth + 1
                    )));
                }
                // Array: element_type (u32) + array_len (u64) + elements
                let element_type = read_u32(cursor)?;
                let array_len = read_u64(cursor)?;
                if array_len > MAX_ARRAY_LEN {
                    return Err(malformed(format!(
                        "Array length {array_len} exceeds maximum {MAX_ARRAY_LEN} (corrupted?)"
                    )));
                }
                let len = usize::try_from(array_len)
                    .map_err(|_| malformed(format!("Array length too large: {array_len}")))?;
                // Every element takes at least one byte
                let remaining = cursor.get_ref().len().saturating_sub(cursor.position() as usize);
                let mut elements = Vec::with_capacity(len.min(remaining));
                for _ in 0..array_len {
                    elements.push(Self::read_value(cursor, element_type, depth + 1)?);
                }
                Ok(GGUFValue::Array(element_type, elements))
            },
            10 => Ok(GGUFValue::UInt64(read_u64(cursor)?)),
            11 => Ok(GGUFValue::Int64(read_i64(cursor)?)),
            12 => Ok(GGUFValue::Float64(read_f64(cursor)?)),
            _ => Err(malformed(format!("Unsupported value type: {value_type}"))),
        }
    }

    fn parse_tensor_info(cursor: &mut Cursor<&[u8]>, count: u64) -> Result<Vec<TensorInfo>> {
        let mut tensors = Vec::new();
        for _ in 0..count {
            let name = read_string(cursor)?;
            let n_dims = read_u32(cursor)?;
            if n_dims > MAX_DIMS {
                return Err(malformed(format!(
                    "tensor '{name}' has {n_dims} dimensions, max allowed is {MAX_DIMS} (corrupted?)"
                )));
            }

            // GGUF stores dimensions in GGML order (reversed from row-major)
            let mut dims = Vec::with_capacity(n_dims as usize);
            for _ in 0..n_dims {
                dims.push(read_u64(cursor)?);
            }
            dims.reverse();

            let qtype = read_u32(cursor)?;
            let offset = read_u64(cursor)?;

            tensors.push(TensorInfo {
                name,
                n_dims,
                dims,
                qtype,
                offset,
            });
        }
        Ok(tensors)
    }

    /// Format-agnostic tensor records
    ///
    /// Tensors of unknown ggml type are kept with size 0 and a warning.
    #[must_use]
    pub fn tensor_records(&self) -> Vec<TensorRecord> {
        self.tensors
            .iter()
            .map(|t| {
                let byte_size = t.byte_size().unwrap_or_else(|| {
                    warn!(tensor = %t.name, qtype = t.qtype, "unknown GGUF tensor type, size shown as 0");
                    0
                });
                TensorRecord::new(t.name.clone(), t.dtype_name(), t.dims.clone(), byte_size)
            })
            .collect()
    }

    /// Metadata rendered for display
    #[must_use]
    pub fn metadata_entries(&self) -> Vec<MetadataEntry> {
        self.metadata
            .iter()
            .map(|(key, value)| MetadataEntry::new(key.clone(), &value.to_string(), value.type_name()))
            .collect()
    }

    /// String metadata value by key
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.metadata.iter().find_map(|(k, v)| match v {
            GGUFValue::String(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    /// Model architecture (`general.architecture`)
    #[must_use]
    pub fn architecture(&self) -> Option<&str> {
        self.get_str("general.architecture")
    }
}

fn reason_of(err: ExplorerError) -> String {
    match err {
        ExplorerError::Format { reason } => reason,
        other => other.to_string(),
    }
}
