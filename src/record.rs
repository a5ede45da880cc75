//! Format-agnostic tensor and metadata records
//!
//! Both container readers adapt their decoded headers into these types, so
//! everything downstream (tree, search, rollup, rendering) is independent of
//! the file format.

use std::path::{Path, PathBuf};

/// One tensor's metadata (never its payload)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorRecord {
    /// Full dotted name, e.g. `model.layers.0.self_attn.q_proj.weight`
    pub name: String,
    /// Format-native dtype name (`F32`, `BF16`, `Q4_K`, ...)
    pub dtype: String,
    /// Dimensions, row-major
    pub shape: Vec<u64>,
    /// Payload size in bytes
    pub byte_size: u64,
    /// File the record was decoded from
    pub source: Option<PathBuf>,
}

impl TensorRecord {
    /// Create a record with no source file
    pub fn new(
        name: impl Into<String>,
        dtype: impl Into<String>,
        shape: Vec<u64>,
        byte_size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
            shape,
            byte_size,
            source: None,
        }
    }

    /// Attach the originating file
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Number of elements (product of the shape; a scalar has one)
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().fold(1u64, |acc, &d| acc.saturating_mul(d))
    }

    /// Last dotted segment of the name
    #[must_use]
    pub fn leaf_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Source file, if known
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Longest metadata value kept for display
pub const MAX_METADATA_VALUE_LEN: usize = 100;

/// One key/value pair from a file's metadata section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Metadata key
    pub key: String,
    /// Value rendered for display (truncated)
    pub value: String,
    /// Value type name as reported by the format
    pub value_type: String,
    /// File the entry was decoded from
    pub source: Option<PathBuf>,
}

impl MetadataEntry {
    /// Create an entry, truncating long values
    pub fn new(key: impl Into<String>, value: &str, value_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: truncate_value(value, MAX_METADATA_VALUE_LEN),
            value_type: value_type.into(),
            source: None,
        }
    }

    /// Attach the originating file
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Truncate `value` to at most `max` chars, ending in `...` when cut
pub(crate) fn truncate_value(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = value.chars().take(keep).collect();
    out.push_str("...");
    out
}
