//! GGUF type definitions and constants
//!
//! - Magic number and supported versions
//! - The ggml tensor type table (name, block size, bytes per block)
//! - Core structs: `GGUFValue`, `GGUFHeader`, `TensorInfo`

use std::fmt;

// ============================================================================
// GGUF Magic and Version Constants
// ============================================================================

/// GGUF magic number: "GGUF" in little-endian
pub const GGUF_MAGIC: u32 = 0x4655_4747;

/// GGUF version 2 (64-bit counts)
pub const GGUF_VERSION_V2: u32 = 2;

/// GGUF version 3 (adds big-endian support; same layout)
pub const GGUF_VERSION_V3: u32 = 3;

/// Upper bound on `tensor_count` accepted from a header
pub const MAX_TENSOR_COUNT: u64 = 100_000;

/// Upper bound on `metadata_count` accepted from a header
pub const MAX_METADATA_COUNT: u64 = 10_000;

/// Upper bound on metadata array length
pub const MAX_ARRAY_LEN: u64 = 10_000_000;

/// Upper bound on arrays nested inside arrays
pub const MAX_ARRAY_DEPTH: usize = 16;

/// Tensors have at most this many dimensions
pub const MAX_DIMS: u32 = 8;

// ============================================================================
// ggml tensor types
// ============================================================================

/// Storage layout of one ggml tensor type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GgmlType {
    /// Type id as stored in the tensor info
    pub id: u32,
    /// Canonical name (`F16`, `Q4_K`, ...)
    pub name: &'static str,
    /// Elements per block
    pub block_size: u64,
    /// Bytes per block
    pub type_size: u64,
}

const fn ty(id: u32, name: &'static str, block_size: u64, type_size: u64) -> GgmlType {
    GgmlType {
        id,
        name,
        block_size,
        type_size,
    }
}

/// Known ggml types; ids 4, 5 and 31-33 are retired
pub const GGML_TYPES: &[GgmlType] = &[
    ty(0, "F32", 1, 4),
    ty(1, "F16", 1, 2),
    ty(2, "Q4_0", 32, 18),
    ty(3, "Q4_1", 32, 20),
    ty(6, "Q5_0", 32, 22),
    ty(7, "Q5_1", 32, 24),
    ty(8, "Q8_0", 32, 34),
    ty(9, "Q8_1", 32, 36),
    ty(10, "Q2_K", 256, 84),
    ty(11, "Q3_K", 256, 110),
    ty(12, "Q4_K", 256, 144),
    ty(13, "Q5_K", 256, 176),
    ty(14, "Q6_K", 256, 210),
    ty(15, "Q8_K", 256, 292),
    ty(16, "IQ2_XXS", 256, 66),
    ty(17, "IQ2_XS", 256, 74),
    ty(18, "IQ3_XXS", 256, 98),
    ty(19, "IQ1_S", 256, 50),
    ty(20, "IQ4_NL", 32, 18),
    ty(21, "IQ3_S", 256, 110),
    ty(22, "IQ2_S", 256, 82),
    ty(23, "IQ4_XS", 256, 136),
    ty(24, "I8", 1, 1),
    ty(25, "I16", 1, 2),
    ty(26, "I32", 1, 4),
    ty(27, "I64", 1, 8),
    ty(28, "F64", 1, 8),
    ty(29, "IQ1_M", 256, 56),
    ty(30, "BF16", 1, 2),
    ty(34, "TQ1_0", 256, 54),
    ty(35, "TQ2_0", 256, 66),
    ty(39, "MXFP4", 32, 17),
];

/// GGUF quantization type: F32 (unquantized float32)
pub const GGUF_TYPE_F32: u32 = 0;

/// GGUF quantization type: F16 (half precision float16)
pub const GGUF_TYPE_F16: u32 = 1;

/// GGUF quantization type: `Q4_0` (4-bit quantization, block size 32)
pub const GGUF_TYPE_Q4_0: u32 = 2;

/// GGUF quantization type: `Q8_0` (8-bit quantization, block size 32)
pub const GGUF_TYPE_Q8_0: u32 = 8;

/// GGUF quantization type: `Q4_K` (4-bit K-quantization, super-block size 256)
pub const GGUF_TYPE_Q4_K: u32 = 12;

/// GGUF quantization type: `Q6_K` (6-bit K-quantization, super-block size 256)
pub const GGUF_TYPE_Q6_K: u32 = 14;

/// Look up a ggml type by id
#[must_use]
pub fn ggml_type(id: u32) -> Option<&'static GgmlType> {
    GGML_TYPES.iter().find(|t| t.id == id)
}

impl GgmlType {
    /// Payload bytes for `n_elements` elements of this type
    #[must_use]
    pub fn byte_size(&self, n_elements: u64) -> u64 {
        let bytes =
            u128::from(n_elements) * u128::from(self.type_size) / u128::from(self.block_size);
        u64::try_from(bytes).unwrap_or(u64::MAX)
    }
}

// ============================================================================
// Core GGUF Types
// ============================================================================

/// GGUF metadata value types
#[derive(Debug, Clone, PartialEq)]
pub enum GGUFValue {
    /// Unsigned 8-bit integer
    UInt8(u8),
    /// Signed 8-bit integer
    Int8(i8),
    /// Unsigned 16-bit integer
    UInt16(u16),
    /// Signed 16-bit integer
    Int16(i16),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Signed 32-bit integer
    Int32(i32),
    /// 32-bit floating point
    Float32(f32),
    /// Boolean
    Bool(bool),
    /// UTF-8 string
    String(String),
    /// Array of values, with the element type id
    Array(u32, Vec<GGUFValue>),
    /// Unsigned 64-bit integer
    UInt64(u64),
    /// Signed 64-bit integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
}

/// Array elements shown before the rest are elided
const ARRAY_PREVIEW: usize = 8;

/// Name of a GGUF metadata value type id
#[must_use]
pub fn value_type_name(type_id: u32) -> &'static str {
    match type_id {
        0 => "UINT8",
        1 => "INT8",
        2 => "UINT16",
        3 => "INT16",
        4 => "UINT32",
        5 => "INT32",
        6 => "FLOAT32",
        7 => "BOOL",
        8 => "STRING",
        9 => "ARRAY",
        10 => "UINT64",
        11 => "INT64",
        12 => "FLOAT64",
        _ => "UNKNOWN",
    }
}

impl GGUFValue {
    /// Type name for display (`UINT32`, `ARRAY[STRING]`, ...)
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::UInt8(_) => value_type_name(0).to_string(),
            Self::Int8(_) => value_type_name(1).to_string(),
            Self::UInt16(_) => value_type_name(2).to_string(),
            Self::Int16(_) => value_type_name(3).to_string(),
            Self::UInt32(_) => value_type_name(4).to_string(),
            Self::Int32(_) => value_type_name(5).to_string(),
            Self::Float32(_) => value_type_name(6).to_string(),
            Self::Bool(_) => value_type_name(7).to_string(),
            Self::String(_) => value_type_name(8).to_string(),
            Self::Array(elem, _) => format!("ARRAY[{}]", value_type_name(*elem)),
            Self::UInt64(_) => value_type_name(10).to_string(),
            Self::Int64(_) => value_type_name(11).to_string(),
            Self::Float64(_) => value_type_name(12).to_string(),
        }
    }
}

impl fmt::Display for GGUFValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt8(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Array(_, items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().take(ARRAY_PREVIEW).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Self::String(s) => write!(f, "{s:?}")?,
                        other => write!(f, "{other}")?,
                    }
                }
                if items.len() > ARRAY_PREVIEW {
                    write!(f, ", ... ({} items)", items.len())?;
                }
                write!(f, "]")
            },
        }
    }
}

/// GGUF file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GGUFHeader {
    /// Magic number (must be `GGUF_MAGIC`)
    pub magic: u32,
    /// Format version
    pub version: u32,
    /// Number of tensors in the file
    pub tensor_count: u64,
    /// Number of metadata key-value pairs
    pub metadata_count: u64,
}

/// Tensor information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    /// Tensor name
    pub name: String,
    /// Number of dimensions
    pub n_dims: u32,
    /// Dimensions, row-major (reversed from the ggml order on disk)
    pub dims: Vec<u64>,
    /// ggml type id
    pub qtype: u32,
    /// Offset of the tensor data, relative to the data section
    pub offset: u64,
}

impl TensorInfo {
    /// Number of elements
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.dims.iter().fold(1u64, |acc, &d| acc.saturating_mul(d))
    }

    /// Type name, or `TYPE_<id>` for ids missing from the table
    #[must_use]
    pub fn dtype_name(&self) -> String {
        ggml_type(self.qtype).map_or_else(|| format!("TYPE_{}", self.qtype), |t| t.name.to_string())
    }

    /// Payload bytes, `None` for unknown types
    #[must_use]
    pub fn byte_size(&self) -> Option<u64> {
        ggml_type(self.qtype).map(|t| t.byte_size(self.num_elements()))
    }
}
