//! Exclusion patterns matched against file basenames
//!
//! Patterns are deliberately tiny: `*` matches any run of characters
//! (including none) and everything else is literal. Matching is anchored to
//! the whole basename, and there is no negation.

use std::fmt;

/// A single compiled exclusion pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    source: String,
    /// Literal pieces between the `*` wildcards
    pieces: Vec<String>,
}

impl Exclusion {
    /// Compile a glob pattern
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        let source = pattern.into();
        let pieces = source.split('*').map(str::to_string).collect();
        Self { source, pieces }
    }

    /// The pattern as written in the settings
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `name` matches this pattern in full
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let (first, rest) = match self.pieces.split_first() {
            Some(split) => split,
            None => return name.is_empty(),
        };

        // No wildcard at all: plain equality
        let Some((last, middle)) = rest.split_last() else {
            return name == first;
        };

        let Some(mut remaining) = name.strip_prefix(first.as_str()) else {
            return false;
        };
        let Some(body) = remaining.strip_suffix(last.as_str()) else {
            return false;
        };
        remaining = body;

        for piece in middle {
            match remaining.find(piece.as_str()) {
                Some(idx) => remaining = &remaining[idx + piece.len()..],
                None => return false,
            }
        }
        true
    }
}

impl From<&str> for Exclusion {
    fn from(src: &str) -> Self {
        Self::new(src)
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// True iff `filename` matches at least one pattern.
///
/// Only the basename is inspected; callers pass the final path component.
#[must_use]
pub fn is_excluded(filename: &str, patterns: &[Exclusion]) -> bool {
    patterns.iter().any(|p| p.matches(filename))
}

/// An ordered list of compiled exclusions
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Exclusion>,
}

impl ExclusionSet {
    /// Compile every pattern in order
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| Exclusion::new(p.as_ref()))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_excluded(&self, filename: &str) -> bool {
        is_excluded(filename, &self.patterns)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn patterns(&self) -> &[Exclusion] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> Vec<Exclusion> {
        patterns.iter().copied().map(Exclusion::from).collect()
    }

    #[test]
    fn test_suffix_wildcard() {
        let patterns = set(&["*.log"]);
        assert!(is_excluded("foo.log", &patterns));
        assert!(is_excluded(".log", &patterns));
        assert!(!is_excluded("readme.md", &patterns));
        assert!(!is_excluded("foo.log.bak", &patterns));
    }

    #[test]
    fn test_prefix_wildcard() {
        let pat = Exclusion::new(".#*");
        assert!(pat.matches(".#lockfile"));
        assert!(pat.matches(".#"));
        assert!(!pat.matches("lockfile.#"));
    }

    #[test]
    fn test_literal_pattern() {
        let pat = Exclusion::new(".DS_Store");
        assert!(pat.matches(".DS_Store"));
        assert!(!pat.matches("x.DS_Store"));
        assert!(!pat.matches(".DS_Store~"));
    }

    #[test]
    fn test_inner_wildcards() {
        let pat = Exclusion::new("a*b*c");
        assert!(pat.matches("abc"));
        assert!(pat.matches("aXXbYYc"));
        assert!(!pat.matches("acb"));
        // the suffix must not be reused by the middle piece
        assert!(!Exclusion::new("a*bc*bc").matches("abc"));
        assert!(Exclusion::new("*").matches(""));
        assert!(Exclusion::new("**").matches("anything"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pat = Exclusion::new("file?.[ch]");
        assert!(pat.matches("file?.[ch]"));
        assert!(!pat.matches("file1.c"));
    }

    #[test]
    fn test_set_short_circuits_and_reports_patterns() {
        let exclusions = ExclusionSet::new(["*~", "*.swp", "Thumbs.db"]);
        assert!(exclusions.is_excluded("notes.txt~"));
        assert!(exclusions.is_excluded("Thumbs.db"));
        assert!(!exclusions.is_excluded("notes.txt"));
        assert_eq!(exclusions.patterns()[1].to_string(), "*.swp");
        assert!(ExclusionSet::default().is_empty());
    }
}
