//! GGUF Test Factory - Synthesizes valid GGUF files in memory
//!
//! `GGUFBuilder` writes a header, metadata, tensor infos and a zero-filled
//! data section sized from the ggml type table.
//!
//! # Example
//!
//! ```
//! use tensor_explorer::gguf::test_factory::GGUFBuilder;
//! use tensor_explorer::gguf::{GGUFModel, GGUF_TYPE_F32};
//!
//! let data = GGUFBuilder::new()
//!     .architecture("llama")
//!     .add_tensor("token_embd.weight", &[100, 64], GGUF_TYPE_F32)
//!     .build();
//!
//! let model = GGUFModel::from_bytes(&data).expect("valid GGUF");
//! assert_eq!(model.tensors.len(), 1);
//! ```

use super::types::{ggml_type, GGUF_MAGIC, GGUF_VERSION_V3};

/// GGUF alignment of the tensor data section
const GGUF_ALIGNMENT: usize = 32;

/// Builder for creating valid GGUF files in memory
#[derive(Debug, Clone)]
pub struct GGUFBuilder {
    version: u32,
    /// Metadata key-value pairs (key, type, value_bytes)
    metadata: Vec<(String, u32, Vec<u8>)>,
    /// Tensor info entries (name, dims, qtype)
    tensors: Vec<(String, Vec<u64>, u32)>,
}

impl Default for GGUFBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn string_bytes(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + value.len());
    bytes.extend_from_slice(&(value.len() as u64).to_le_bytes());
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

impl GGUFBuilder {
    /// Create a new GGUF v3 builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: GGUF_VERSION_V3,
            metadata: Vec::new(),
            tensors: Vec::new(),
        }
    }

    /// Override the header version
    #[must_use]
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Add a string metadata value
    #[must_use]
    pub fn add_string(mut self, key: &str, value: &str) -> Self {
        self.metadata
            .push((key.to_string(), 8, string_bytes(value)));
        self
    }

    /// Add a u32 metadata value
    #[must_use]
    pub fn add_u32(mut self, key: &str, value: u32) -> Self {
        self.metadata
            .push((key.to_string(), 4, value.to_le_bytes().to_vec()));
        self
    }

    /// Add a f32 metadata value
    #[must_use]
    pub fn add_f32(mut self, key: &str, value: f32) -> Self {
        self.metadata
            .push((key.to_string(), 6, value.to_le_bytes().to_vec()));
        self
    }

    /// Add an array-of-strings metadata value
    #[must_use]
    pub fn add_string_array(mut self, key: &str, values: &[&str]) -> Self {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&(values.len() as u64).to_le_bytes());
        for v in values {
            bytes.extend_from_slice(&string_bytes(v));
        }
        self.metadata.push((key.to_string(), 9, bytes));
        self
    }

    /// Add a raw metadata entry (type id plus encoded value)
    #[must_use]
    pub fn add_raw(mut self, key: &str, value_type: u32, value_bytes: Vec<u8>) -> Self {
        self.metadata
            .push((key.to_string(), value_type, value_bytes));
        self
    }

    /// Set architecture (shorthand for general.architecture)
    #[must_use]
    pub fn architecture(self, arch: &str) -> Self {
        self.add_string("general.architecture", arch)
    }

    /// Add a tensor with row-major `dims` and ggml type `qtype`
    #[must_use]
    pub fn add_tensor(mut self, name: &str, dims: &[u64], qtype: u32) -> Self {
        self.tensors.push((name.to_string(), dims.to_vec(), qtype));
        self
    }

    /// Build the GGUF file bytes
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut data = Vec::new();

        // Header
        data.extend_from_slice(&GGUF_MAGIC.to_le_bytes());
        data.extend_from_slice(&self.version.to_le_bytes());
        data.extend_from_slice(&(self.tensors.len() as u64).to_le_bytes());
        data.extend_from_slice(&(self.metadata.len() as u64).to_le_bytes());

        // Metadata
        for (key, value_type, value_bytes) in &self.metadata {
            data.extend_from_slice(&string_bytes(key));
            data.extend_from_slice(&value_type.to_le_bytes());
            data.extend_from_slice(value_bytes);
        }

        // Tensor info
        let mut tensor_data_offset = 0u64;
        for (name, dims, qtype) in &self.tensors {
            data.extend_from_slice(&string_bytes(name));
            data.extend_from_slice(&(dims.len() as u32).to_le_bytes());
            // Dimensions (reversed for GGML order)
            for dim in dims.iter().rev() {
                data.extend_from_slice(&dim.to_le_bytes());
            }
            data.extend_from_slice(&qtype.to_le_bytes());
            data.extend_from_slice(&tensor_data_offset.to_le_bytes());

            let n_elements = dims.iter().product::<u64>();
            tensor_data_offset += ggml_type(*qtype).map_or(0, |t| t.byte_size(n_elements));
        }

        let aligned = data.len().div_ceil(GGUF_ALIGNMENT) * GGUF_ALIGNMENT;
        data.resize(aligned, 0);
        data.resize(aligned + tensor_data_offset as usize, 0);
        data
    }
}
