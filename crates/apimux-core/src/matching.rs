//! Ant-style path pattern matching
//!
//! Patterns use glob syntax with literal separators: `*` stays within one
//! path segment, `**` crosses segments. Matching never allocates per
//! request once a set is compiled.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

const PATH_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// An ordered, pre-compiled set of path patterns.
#[derive(Debug, Clone)]
pub struct PathPatternSet {
    patterns: Vec<Pattern>,
}

impl PathPatternSet {
    /// Compile a set of patterns. Fails on the first invalid pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| compile_pattern(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether any pattern matches the path
    pub fn matches(&self, path: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(path, PATH_MATCH_OPTIONS))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Compile a single path pattern
pub fn compile_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).with_context(|| format!("invalid path pattern: {pattern}"))
}

/// Match one pattern against a path. Invalid patterns never match.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    Pattern::new(pattern)
        .map(|p| p.matches_with(path, PATH_MATCH_OPTIONS))
        .unwrap_or(false)
}
