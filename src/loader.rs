//! Multi-file loading
//!
//! Headers are decoded in parallel; records are then inserted into the tree
//! one file at a time on the calling thread, in file-list order. Nothing
//! sees the tree until every insert has finished, and later files win on
//! duplicate tensor names.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{ExplorerError, Result};
use crate::format::{DecodedFile, FormatSource};
use crate::record::{MetadataEntry, TensorRecord};
use crate::tree::{InsertOutcome, TensorTree};

/// A tensor name that appeared more than once across the loaded files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateOverwrite {
    /// Tensor name
    pub name: String,
    /// File of the record that was replaced
    pub previous: Option<PathBuf>,
    /// File of the record that replaced it
    pub replacement: Option<PathBuf>,
}

/// A file that could not be decoded
#[derive(Debug)]
pub struct FileFailure {
    /// File path
    pub path: PathBuf,
    /// Why it failed
    pub error: ExplorerError,
}

/// Result of loading a file list
#[derive(Debug)]
pub struct LoadReport {
    /// Merged tree
    pub tree: TensorTree,
    /// Metadata from every loaded file, in file order
    pub metadata: Vec<MetadataEntry>,
    /// Files that decoded successfully
    pub loaded_files: Vec<PathBuf>,
    /// Files that were skipped
    pub failures: Vec<FileFailure>,
    /// Tensor names overwritten by a later file
    pub overwrites: Vec<DuplicateOverwrite>,
}

impl LoadReport {
    /// Number of files that contributed to the tree
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.loaded_files.len()
    }
}

/// Decode every source and merge the results into one tree
///
/// Per-file failures are logged and recorded in the report.
///
/// # Errors
///
/// Returns `ExplorerError::AllFilesFailed` when `sources` is non-empty and
/// no file decodes.
pub fn load(sources: &[FormatSource]) -> Result<LoadReport> {
    let decoded: Vec<Result<DecodedFile>> = sources.par_iter().map(FormatSource::decode).collect();
    merge(sources, decoded)
}

/// Sequential write barrier: insert decoded files in list order
fn merge(sources: &[FormatSource], decoded: Vec<Result<DecodedFile>>) -> Result<LoadReport> {
    let mut report = LoadReport {
        tree: TensorTree::new(),
        metadata: Vec::new(),
        loaded_files: Vec::new(),
        failures: Vec::new(),
        overwrites: Vec::new(),
    };

    for (source, result) in sources.iter().zip(decoded) {
        match result {
            Ok(file) => {
                debug!(
                    path = %source.path.display(),
                    format = %source.format,
                    tensors = file.records.len(),
                    "decoded header"
                );
                insert_records(&mut report, file.records);
                report.metadata.extend(file.metadata);
                report.loaded_files.push(source.path.clone());
            },
            Err(error) => {
                warn!(path = %source.path.display(), %error, "skipping file");
                report.failures.push(FileFailure {
                    path: source.path.clone(),
                    error,
                });
            },
        }
    }

    if !sources.is_empty() && report.loaded_files.is_empty() {
        return Err(ExplorerError::AllFilesFailed {
            count: sources.len(),
        });
    }

    info!(
        files = report.file_count(),
        failed = report.failures.len(),
        tensors = report.tree.tensor_count(),
        bytes = report.tree.total_bytes(),
        "loaded"
    );
    Ok(report)
}

fn insert_records(report: &mut LoadReport, records: Vec<TensorRecord>) {
    for record in records {
        let replacement = record.source.clone();
        let name = record.name.clone();
        if let InsertOutcome::Replaced { previous } = report.tree.insert(record) {
            debug!(
                tensor = %name,
                previous = ?previous.source,
                replacement = ?replacement,
                "duplicate tensor name, later file wins"
            );
            report.overwrites.push(DuplicateOverwrite {
                name,
                previous: previous.source,
                replacement,
            });
        }
    }
}
