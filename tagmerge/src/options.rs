//! Tunables for merge calls.

/// Default maximum nesting depth of aggregate-shaped fields.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Options applied to every frame of a merge call.
///
/// # Examples
///
/// ```rust
/// use tagmerge::MergeOptions;
///
/// let options = MergeOptions::default().with_max_depth(4);
/// assert_eq!(options.max_depth(), 4);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MergeOptions {
    max_depth: usize,
}

impl MergeOptions {
    /// Options with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limits how many nested aggregates a merge may descend through.
    ///
    /// Depth `0` permits only the root frame.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Maximum nesting depth.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::new()
    }
}
