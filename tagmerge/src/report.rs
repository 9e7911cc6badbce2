//! Audit trail of the fields a merge overwrote.

use std::fmt;

/// Ordered dotted paths of every destination field a merge wrote.
///
/// Paths use destination field names joined with `.`, for example
/// `"address.city"`. Order follows traversal order, which callers should
/// not rely upon; use [`MergeReport::contains`] or sort the paths.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MergeReport {
    paths: Vec<String>,
}

impl MergeReport {
    /// Empty report.
    #[must_use]
    pub const fn new() -> Self {
        Self { paths: Vec::new() }
    }

    pub(crate) fn record(&mut self, path: String) {
        self.paths.push(path);
    }

    pub(crate) fn extend(&mut self, other: Self) {
        self.paths.extend(other.paths);
    }

    /// Recorded paths in traversal order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Whether `path` was written.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|recorded| recorded == path)
    }

    /// Number of written fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the merge changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Recorded paths sorted lexicographically.
    #[must_use]
    pub fn sorted(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.paths.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    /// Consumes the report, returning the paths.
    #[must_use]
    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }

    /// Iterates over the recorded paths.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.paths.iter()
    }
}

impl IntoIterator for MergeReport {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a MergeReport {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.paths.join(", "))
    }
}
