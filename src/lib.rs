//! # tensor-explorer
//!
//! Browse the tensors inside SafeTensors and GGUF model files without
//! loading any tensor data.
//!
//! Only file headers are read (memory-mapped, decoded in parallel). Every
//! tensor from every file is merged into one [`tree::TensorTree`] keyed by
//! the dot-separated segments of its name, with numeric segments in natural
//! order (`layers.2` before `layers.10`) and byte/tensor totals on every
//! group.
//!
//! ## Example
//!
//! ```rust
//! use tensor_explorer::navigation::{apply, InputEvent, NavigationState, Session};
//! use tensor_explorer::record::TensorRecord;
//! use tensor_explorer::tree::TensorTree;
//!
//! let tree = TensorTree::from_records([
//!     TensorRecord::new("model.layers.10.mlp.weight", "BF16", vec![64, 64], 8192),
//!     TensorRecord::new("model.layers.2.mlp.weight", "BF16", vec![64, 64], 8192),
//! ]);
//! assert_eq!(tree.tensor_count(), 2);
//! assert_eq!(tree.total_bytes(), 16384);
//!
//! let session = Session::new(tree);
//! let state = NavigationState::new();
//! let state = apply(state, InputEvent::Enter, &session).state;
//! let rows = state.rows(session.tree());
//! assert_eq!(rows.len(), 2); // "model" expanded, showing "layers"
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! cli ─> discover ─> loader ─┬─> tui  (navigation, flatten, search)
//!                            └─> viz  (rollup)
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
// Clippy allows (MUST come after deny/warn to override them)
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_wrap)] // u64 -> i64 for scores
#![allow(clippy::cast_precision_loss)] // u64 -> f64 for display is acceptable
#![allow(clippy::cast_possible_truncation)] // u16 terminal heights
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)] // Some renderers are naturally long
#![allow(clippy::must_use_candidate)] // Not all methods need #[must_use]
#![allow(clippy::doc_markdown)] // Allow technical terms without backticks
#![allow(clippy::uninlined_format_args)] // Prefer explicit format args
#![allow(clippy::single_match_else)] // Sometimes clearer than if-let
#![allow(clippy::missing_panics_doc)] // Allow missing Panics doc sections
#![allow(clippy::format_push_string)] // HTML assembly

/// Command-line parsing and the top-level run pipeline
pub mod cli;
/// Path argument resolution (files, directories, globs, shard indexes)
pub mod discover;
/// Human-readable sizes, shapes and counts
pub mod display;
/// Error types
pub mod error;
/// Row flattening for the tree view
pub mod flatten;
/// Model format detection and dispatch
pub mod format;
/// GGUF header reader
pub mod gguf;
/// Parallel multi-file loading
pub mod loader;
/// Natural (numeric-aware) ordering of name segments
pub mod natural;
/// Browse/search state machine
pub mod navigation;
/// Tensor and metadata records
pub mod record;
/// Per-node size rollups for charting
pub mod rollup;
/// SafeTensors header reader
pub mod safetensors;
/// Fuzzy tensor name search
pub mod search;
/// Tensor name hierarchy
pub mod tree;
/// Interactive terminal browser
pub mod tui;
/// Sunburst chart output
pub mod viz;

pub use error::{ExplorerError, Result};
pub use record::{MetadataEntry, TensorRecord};
pub use tree::TensorTree;
