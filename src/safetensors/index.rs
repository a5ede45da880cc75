//! Sharded checkpoint index (`model.safetensors.index.json`)

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ExplorerError, Result};
use crate::natural::NaturalKey;

/// File-name suffix of a shard index sidecar
pub const INDEX_SUFFIX: &str = ".safetensors.index.json";

/// JSON structure for model.safetensors.index.json
#[derive(Debug, Clone, Deserialize)]
pub struct SafetensorsIndex {
    /// Mapping from tensor name to shard filename
    pub weight_map: HashMap<String, String>,
}

impl SafetensorsIndex {
    /// Whether `path` names an index sidecar
    #[must_use]
    pub fn is_index_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(INDEX_SUFFIX))
    }

    /// Read and parse an index file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not valid index JSON.
    pub fn load(index_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(index_path).map_err(|e| ExplorerError::Io {
            message: format!(
                "Failed to read index file '{}': {}",
                index_path.display(),
                e
            ),
        })?;
        serde_json::from_str(&content).map_err(|e| ExplorerError::Format {
            reason: format!(
                "Failed to parse index file '{}': {}",
                index_path.display(),
                e
            ),
        })
    }

    /// Unique shard files, resolved against `base_dir`, in natural order
    #[must_use]
    pub fn shard_paths(&self, base_dir: &Path) -> Vec<PathBuf> {
        let unique: BTreeSet<NaturalKey> = self
            .weight_map
            .values()
            .map(|f| NaturalKey::new(f.as_str()))
            .collect();
        unique
            .into_iter()
            .map(|f| base_dir.join(f.as_str()))
            .collect()
    }
}
