//! Fuzzy search over every tensor name
//!
//! The index holds the full dotted name of every leaf in the tree, built once
//! per tree generation and independent of which groups are expanded.
//!
//! ## Ranking
//!
//! A tensor matches when the query is a case-insensitive subsequence of its
//! name. Its score is:
//!
//! ```text
//! score = skim_score                         (contiguity, word/segment starts)
//!       + SUBSTRING_BONUS      if query is a substring
//!       + BOUNDARY_BONUS       if that substring starts a segment
//!       + EXACT_SEGMENT_BONUS  if the last segment equals the query
//!       + EXACT_PATH_BONUS     if the whole name equals the query
//!       - edit_distance        (= chars(name) - chars(query) for a subsequence)
//! ```
//!
//! All comparisons in the bonuses are case-insensitive. Results are sorted by
//! score descending, ties broken by natural order of the name.

use std::cmp::Ordering;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::natural::natural_cmp;
use crate::tree::TensorTree;

/// Bonus when the query occurs contiguously
pub const SUBSTRING_BONUS: i64 = 100;
/// Bonus when a contiguous occurrence starts at a segment boundary
pub const BOUNDARY_BONUS: i64 = 50;
/// Bonus when the last segment equals the query
pub const EXACT_SEGMENT_BONUS: i64 = 200;
/// Bonus when the whole name equals the query
pub const EXACT_PATH_BONUS: i64 = 400;

/// One ranked result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Full dotted tensor name
    pub path: String,
    /// Relevance, higher is better
    pub score: i64,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    path: String,
    lower: String,
    last_segment_lower: String,
    char_len: usize,
}

/// Searchable list of all tensor names
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
    generation: u64,
    matcher: SkimMatcherV2,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("entries", &self.entries.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl SearchIndex {
    /// Index every leaf of `tree`
    #[must_use]
    pub fn build(tree: &TensorTree) -> Self {
        let entries = tree
            .leaves()
            .map(|record| {
                let lower = record.name.to_lowercase();
                let last_segment_lower = lower.rsplit('.').next().unwrap_or("").to_string();
                IndexEntry {
                    path: record.name.clone(),
                    char_len: record.name.chars().count(),
                    lower,
                    last_segment_lower,
                }
            })
            .collect();
        Self {
            entries,
            generation: tree.generation(),
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// Number of indexed tensors
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the index holds no tensors
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `tree` has been mutated since this index was built
    #[must_use]
    pub fn is_stale(&self, tree: &TensorTree) -> bool {
        self.generation != tree.generation()
    }

    /// Rank every tensor against `query`
    ///
    /// An empty query yields no results.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        if query.is_empty() {
            return Vec::new();
        }
        let query_lower = query.to_lowercase();
        let query_len = query.chars().count();

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let base = self.matcher.fuzzy_match(&entry.path, query)?;
                Some(SearchHit {
                    path: entry.path.clone(),
                    score: base + bonus(entry, &query_lower, query_len),
                })
            })
            .collect();

        hits.sort_by(rank_order);
        hits
    }
}

fn bonus(entry: &IndexEntry, query_lower: &str, query_len: usize) -> i64 {
    let mut bonus = 0i64;
    let mut occurrences = entry.lower.match_indices(query_lower).peekable();
    if occurrences.peek().is_some() {
        bonus += SUBSTRING_BONUS;
        let at_boundary = occurrences
            .any(|(start, _)| start == 0 || entry.lower.as_bytes()[start - 1] == b'.');
        if at_boundary {
            bonus += BOUNDARY_BONUS;
        }
    }
    if entry.last_segment_lower == query_lower {
        bonus += EXACT_SEGMENT_BONUS;
    }
    if entry.lower == query_lower {
        bonus += EXACT_PATH_BONUS;
    }
    let distance = entry.char_len.saturating_sub(query_len);
    bonus - i64::try_from(distance).unwrap_or(i64::MAX)
}

fn rank_order(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| natural_cmp(&a.path, &b.path))
}
