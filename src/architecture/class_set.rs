//! ClassSet: a named list of name patterns.

use crate::matcher::{NameMatcher, PatternSet};

/// Named set of glob-style name patterns.
///
/// Used both for the names a component consists of (API and Impl sets) and
/// for the names a component may reference (usage rules). Patterns are stored
/// normalized, so `com.acme.*` is kept as `com.acme.**`.
#[derive(Debug, Clone)]
pub struct ClassSet {
    name: String,
    patterns: Vec<String>,
    matcher: NameMatcher,
    compiled: PatternSet,
}

impl ClassSet {
    pub fn new(name: impl Into<String>, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::with_matcher(name, patterns, NameMatcher::default())
    }

    pub fn with_matcher(
        name: impl Into<String>,
        patterns: impl IntoIterator<Item = impl Into<String>>,
        matcher: NameMatcher,
    ) -> Self {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| matcher.normalize(&p.into()))
            .collect();
        let compiled = matcher.compile(&patterns);
        Self { name: name.into(), patterns, matcher, compiled }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn patterns(&self) -> &[String] { &self.patterns }
    pub fn separator(&self) -> &str { self.matcher.separator() }

    /// True if any pattern matches `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.compiled.is_match(name)
    }
}
