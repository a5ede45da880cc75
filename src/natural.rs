//! Natural ("human") ordering for tensor path segments
//!
//! Strings are split into maximal runs of ASCII digits and maximal runs of
//! everything else, then compared run by run:
//!
//! ```text
//! "layer.10"  ->  [Text("layer."), Num("10")]
//! "a01b"      ->  [Text("a"), Num("01"), Text("b")]
//! ```
//!
//! | Runs compared | Rule |
//! |---------------|------|
//! | number / number | value, then shorter literal, then literal |
//! | text / text | ordinal (byte order, case-sensitive) |
//! | number / text | number first |
//! | prefix | shorter sequence first |
//!
//! The order is strict: two different strings never compare equal, which
//! keeps sibling order deterministic.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Num(&'a str),
    Text(&'a str),
}

/// Iterator over digit / non-digit runs of a string
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Run<'a>> {
        let first = *self.rest.as_bytes().first()?;
        let digits = first.is_ascii_digit();
        // ASCII digits are single-byte, so every split point is a char boundary
        let end = self
            .rest
            .bytes()
            .position(|b| b.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits { Run::Num(run) } else { Run::Text(run) })
    }
}

fn runs(s: &str) -> Runs<'_> {
    Runs { rest: s }
}

fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a_val = a.trim_start_matches('0');
    let b_val = b.trim_start_matches('0');
    a_val
        .len()
        .cmp(&b_val.len())
        .then_with(|| a_val.cmp(b_val))
        .then_with(|| a.len().cmp(&b.len()))
        .then_with(|| a.cmp(b))
}

fn cmp_run(a: Run<'_>, b: Run<'_>) -> Ordering {
    match (a, b) {
        (Run::Num(x), Run::Num(y)) => cmp_numeric(x, y),
        (Run::Text(x), Run::Text(y)) => x.cmp(y),
        (Run::Num(_), Run::Text(_)) => Ordering::Less,
        (Run::Text(_), Run::Num(_)) => Ordering::Greater,
    }
}

/// Compare two strings in natural order
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = runs(a);
    let mut right = runs(b);
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match cmp_run(x, y) {
                Ordering::Equal => {},
                other => return other,
            },
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}

/// Owned string ordered by [`natural_cmp`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NaturalKey(String);

impl NaturalKey {
    /// Wrap a string
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the wrapped string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for NaturalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        natural_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for NaturalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NaturalKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
