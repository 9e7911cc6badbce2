//! Directive grammar and the parsed per-field [`Policy`].
//!
//! A directive is the string value attached to a field through
//! `#[merge(from = "...")]` or `#[merge(into = "...")]`:
//!
//! ```text
//! directive := [paired_name] ("," option)*
//! option    := "nooverwrite" | "omitmissing"
//! ```
//!
//! Unknown options are ignored so newer directives keep parsing on older
//! releases. An empty `paired_name` pairs the field with the field of the
//! same name on the other aggregate.

use std::fmt;

const NO_OVERWRITE: &str = "nooverwrite";
const OMIT_MISSING: &str = "omitmissing";

/// Which table of directives drives a merge call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Directives live on destination fields (`from`) and name source fields.
    Outbound,
    /// Directives live on source fields (`into`) and name destination fields.
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Outbound => "outbound",
            Self::Inbound => "inbound",
        })
    }
}

/// Merge policy parsed from a single directive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Policy {
    paired_name: String,
    suppress_overwrite: bool,
    tolerate_missing_pair: bool,
}

impl Policy {
    /// Parses `directive` for the field declared as `field_name`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tagmerge::Policy;
    ///
    /// let policy = Policy::parse("port_override,nooverwrite", "port");
    /// assert_eq!(policy.paired_name(), "port_override");
    /// assert!(policy.suppress_overwrite());
    /// assert!(!policy.tolerate_missing_pair());
    ///
    /// let same_name = Policy::parse(",omitmissing", "port");
    /// assert_eq!(same_name.paired_name(), "port");
    /// ```
    #[must_use]
    pub fn parse(directive: &str, field_name: &str) -> Self {
        let mut parts = directive.split(',').map(str::trim);
        let named = parts.next().unwrap_or_default();
        let mut policy = Self {
            paired_name: if named.is_empty() {
                field_name.to_owned()
            } else {
                named.to_owned()
            },
            suppress_overwrite: false,
            tolerate_missing_pair: false,
        };
        for option in parts {
            match option {
                NO_OVERWRITE => policy.suppress_overwrite = true,
                OMIT_MISSING => policy.tolerate_missing_pair = true,
                _ => {}
            }
        }
        policy
    }

    /// Parses an optional directive; `None` means the field carries none.
    #[must_use]
    pub fn parse_optional(directive: Option<&str>, field_name: &str) -> Option<Self> {
        directive.map(|raw| Self::parse(raw, field_name))
    }

    /// Name of the field on the other aggregate.
    #[must_use]
    pub fn paired_name(&self) -> &str {
        &self.paired_name
    }

    /// Whether existing non-empty destination data wins over incoming data.
    #[must_use]
    pub const fn suppress_overwrite(&self) -> bool {
        self.suppress_overwrite
    }

    /// Whether an absent paired field is skipped instead of reported.
    #[must_use]
    pub const fn tolerate_missing_pair(&self) -> bool {
        self.tolerate_missing_pair
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.paired_name)?;
        if self.suppress_overwrite {
            write!(f, ",{NO_OVERWRITE}")?;
        }
        if self.tolerate_missing_pair {
            write!(f, ",{OMIT_MISSING}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for directive parsing.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty("", "field", false, false)]
    #[case::explicit("field", "field", false, false)]
    #[case::renamed("other", "other", false, false)]
    #[case::nooverwrite(",nooverwrite", "field", true, false)]
    #[case::omitmissing(",omitmissing", "field", false, true)]
    #[case::both("src,nooverwrite,omitmissing", "src", true, true)]
    #[case::reordered(",omitmissing,nooverwrite", "field", true, true)]
    #[case::unknown_ignored("src,deep,nooverwrite", "src", true, false)]
    #[case::padded(" src , nooverwrite ", "src", true, false)]
    fn parses_directive(
        #[case] raw: &str,
        #[case] paired: &str,
        #[case] suppress: bool,
        #[case] tolerate: bool,
    ) {
        let policy = Policy::parse(raw, "field");
        assert_eq!(policy.paired_name(), paired);
        assert_eq!(policy.suppress_overwrite(), suppress);
        assert_eq!(policy.tolerate_missing_pair(), tolerate);
    }

    #[rstest]
    fn absent_directive_yields_no_policy() {
        assert!(Policy::parse_optional(None, "field").is_none());
        assert!(Policy::parse_optional(Some(""), "field").is_some());
    }

    #[rstest]
    #[case("src,nooverwrite,omitmissing")]
    #[case("field")]
    fn display_renders_canonical_form(#[case] raw: &str) {
        assert_eq!(Policy::parse(raw, "field").to_string(), raw);
    }
}
