//! Synchronous banned-content pre-check.

use regex::{RegexSet, RegexSetBuilder};

/// Case-insensitive set of banned-content patterns, compiled once.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    patterns: RegexSet,
}

impl ContentFilter {
    /// Compiles the patterns.
    ///
    /// # Errors
    ///
    /// Returns the regex error for the first pattern that does not compile.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()?;
        Ok(Self { patterns })
    }

    /// A filter that never matches.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            patterns: RegexSet::empty(),
        }
    }

    /// Returns the first matching pattern, if any.
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let index = self.patterns.matches(text).iter().next()?;
        self.patterns.patterns().get(index).map(String::as_str)
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if there are no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
