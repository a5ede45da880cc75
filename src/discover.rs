//! Command-line path resolution
//!
//! Each argument is one of:
//!
//! | Argument | Resolves to |
//! |----------|-------------|
//! | `.safetensors` / `.gguf` file | itself |
//! | `*.safetensors.index.json` file | its shard files |
//! | directory with one index sidecar | the sidecar's shard files |
//! | other directory | its model files (all depths with `-r`) |
//! | glob pattern | each match, resolved by the rules above |
//!
//! Per-argument results are in natural order; arguments keep their command
//! line order and the first occurrence of a file wins.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ExplorerError, Result};
use crate::format::{detect_format_from_path, FormatSource};
use crate::natural::natural_cmp;
use crate::safetensors::SafetensorsIndex;

/// Whether `arg` contains glob metacharacters
fn is_glob(arg: &str) -> bool {
    arg.contains(['*', '?', '['])
}

/// Resolve command-line arguments to the ordered list of files to load
///
/// # Errors
///
/// Returns `ExplorerError::PathResolution` if a glob pattern is invalid, a
/// directory holds more than one index sidecar, an index cannot be read, or
/// nothing loadable is found.
pub fn resolve_paths<S: AsRef<str>>(args: &[S], recursive: bool) -> Result<Vec<FormatSource>> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        for path in resolve_arg(arg, recursive)? {
            let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !seen.insert(key) {
                debug!(path = %path.display(), "skipping duplicate path");
                continue;
            }
            match FormatSource::from_path(&path) {
                Ok(source) => sources.push(source),
                Err(_) => debug!(path = %path.display(), "skipping unsupported file"),
            }
        }
    }

    if sources.is_empty() {
        return Err(ExplorerError::PathResolution {
            reason: "No SafeTensors or GGUF files found in the specified paths".to_string(),
        });
    }
    Ok(sources)
}

fn resolve_arg(arg: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let literal = Path::new(arg);
    if literal.exists() {
        return resolve_existing(literal, recursive);
    }
    if !is_glob(arg) {
        warn!(path = arg, "path does not exist, skipping");
        return Ok(Vec::new());
    }

    let matches = glob::glob(arg).map_err(|e| ExplorerError::PathResolution {
        reason: format!("Invalid glob pattern '{arg}': {e}"),
    })?;
    let mut expanded: Vec<PathBuf> = matches
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "unreadable glob match, skipping");
                None
            },
        })
        .collect();
    if expanded.is_empty() {
        warn!(pattern = arg, "glob pattern matched nothing");
    }
    sort_natural(&mut expanded);

    let mut out = Vec::new();
    for path in expanded {
        out.extend(resolve_existing(&path, recursive)?);
    }
    Ok(out)
}

fn resolve_existing(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        return resolve_dir(path, recursive);
    }
    if SafetensorsIndex::is_index_file(path) {
        return shards_of(path);
    }
    if detect_format_from_path(path).is_ok() {
        return Ok(vec![path.to_path_buf()]);
    }
    warn!(path = %path.display(), "not a SafeTensors or GGUF file, skipping");
    Ok(Vec::new())
}

fn resolve_dir(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut sidecars = Vec::new();
    let mut models = Vec::new();
    let max_depth = if recursive { usize::MAX } else { 1 };

    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "unreadable directory entry, skipping");
                continue;
            },
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if entry.depth() == 1 && SafetensorsIndex::is_index_file(path) {
            sidecars.push(path.to_path_buf());
        } else if detect_format_from_path(path).is_ok() {
            models.push(path.to_path_buf());
        }
    }

    match sidecars.len() {
        0 => {
            sort_natural(&mut models);
            debug!(dir = %dir.display(), files = models.len(), "scanned directory");
            Ok(models)
        },
        1 => {
            debug!(index = %sidecars[0].display(), "using shard index");
            shards_of(&sidecars[0])
        },
        n => Err(ExplorerError::PathResolution {
            reason: format!(
                "Directory '{}' holds {n} shard index files; pass one of them explicitly",
                dir.display()
            ),
        }),
    }
}

fn shards_of(index_path: &Path) -> Result<Vec<PathBuf>> {
    let index = SafetensorsIndex::load(index_path).map_err(|e| ExplorerError::PathResolution {
        reason: e.to_string(),
    })?;
    let base = index_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(index.shard_paths(base))
}

fn sort_natural(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
}
