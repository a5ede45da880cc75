//! GGUF (GPT-Generated Unified Format) header reader
//!
//! Reads tensor infos and metadata from `.gguf` files used by llama.cpp,
//! Ollama, and compatible tools. The file is memory-mapped and parsing stops
//! at the end of the tensor info section.
//!
//! Format specification: <https://github.com/ggerganov/ggml/blob/master/docs/gguf.md>
//!
//! ```text
//! GGUF := MAGIC VERSION TENSOR_COUNT METADATA_COUNT METADATA* TENSOR_INFO* (pad) DATA
//! METADATA    := key: string, value_type: u32, value
//! TENSOR_INFO := name: string, n_dims: u32, dims: u64[n_dims], type: u32, offset: u64
//! string      := len: u64, utf8 bytes
//! ```

mod io;
mod loader;
/// In-memory GGUF file synthesis for tests and benchmarks
pub mod test_factory;
mod types;

use std::path::Path;

use crate::error::{ExplorerError, Result};
use crate::format::DecodedFile;

pub use loader::GGUFModel;
pub use types::{
    ggml_type, value_type_name, GGUFHeader, GGUFValue, GgmlType, TensorInfo, GGML_TYPES,
    GGUF_MAGIC, GGUF_TYPE_F16, GGUF_TYPE_F32, GGUF_TYPE_Q4_0, GGUF_TYPE_Q4_K, GGUF_TYPE_Q6_K,
    GGUF_TYPE_Q8_0, GGUF_VERSION_V2, GGUF_VERSION_V3, MAX_ARRAY_DEPTH, MAX_ARRAY_LEN, MAX_DIMS,
    MAX_METADATA_COUNT, MAX_TENSOR_COUNT,
};

/// Decode a `.gguf` file's header into records
///
/// # Errors
///
/// Returns `ExplorerError::Decode` naming `path` on any failure.
pub fn read_file(path: &Path) -> Result<DecodedFile> {
    let decode = || -> Result<DecodedFile> {
        let file = std::fs::File::open(path).map_err(|e| ExplorerError::Io {
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

        let model = GGUFModel::from_bytes(&mmap)?;
        let records = model
            .tensor_records()
            .into_iter()
            .map(|r| r.with_source(path))
            .collect();
        let metadata = model
            .metadata_entries()
            .into_iter()
            .map(|m| m.with_source(path))
            .collect();
        Ok(DecodedFile { records, metadata })
    };
    decode().map_err(|e| e.at_path(path))
}

#[cfg(test)]
mod tests;
