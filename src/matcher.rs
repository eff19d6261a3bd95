//! Ant-style name patterns over separator-delimited names.
//!
//! Names and patterns are split on the separator (default `.`); empty
//! segments are ignored. A `**` segment matches zero or more name segments.
//! Inside a segment `*` matches any run of characters and `?` exactly one.
//!
//! A pattern equal to `*` or ending in `separator + "*"` is widened to end in
//! `separator + "**"`, so `com.acme.*` also matches `com.acme` itself and
//! everything below it.
//!
//! | Pattern | Name | Match |
//! |---------|------|-------|
//! | `com.my.*.module.*` | `com.my.p2.subprj.module.a.A1` | no |
//! | `com.my.**.module.*` | `com.my.p2.subprj.module.a.A1` | yes |
//! | `org.slf4j**` | `org.slf4jOrSo` | yes |
//! | `org.slf4j**` | `org.slf4j.Logger` | no |
//!
//! Patterns compile to a [`globset::GlobSet`] over `/`-joined segments, so
//! a pattern list is compiled once and then matched against every node.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_SEPARATOR: &str = ".";

/// Stands in for a literal `/` inside a segment, so it can not split it.
const SLASH_IN_SEGMENT: char = '\u{1f}';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameMatcher {
    separator: String,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl NameMatcher {
    pub fn new(separator: impl Into<String>) -> Self {
        Self { separator: separator.into() }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Widen a trailing single-segment wildcard to `**`.
    pub fn normalize(&self, pattern: &str) -> String {
        let trailing = format!("{}*", self.separator);
        if pattern == "*" || (pattern.ends_with(&trailing) && !pattern.ends_with("**")) {
            format!("{pattern}*")
        } else {
            pattern.to_owned()
        }
    }

    /// Compile `patterns` into one set.
    pub fn compile<S: AsRef<str>>(&self, patterns: &[S]) -> PatternSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            for glob in self.globs(&self.normalize(pattern.as_ref())) {
                match GlobBuilder::new(&glob).literal_separator(true).backslash_escape(true).build() {
                    Ok(glob) => {
                        builder.add(glob);
                    }
                    Err(e) => warn!("Ignoring pattern {}: {}", pattern.as_ref(), e),
                }
            }
        }
        let set = builder.build().unwrap_or_else(|e| {
            warn!("Pattern set {:?} does not compile: {}", patterns.iter().map(AsRef::as_ref).collect::<Vec<_>>(), e);
            GlobSet::empty()
        });
        PatternSet { set, separator: self.separator.clone() }
    }

    /// One-off match. Prefer [`NameMatcher::compile`] for repeated use.
    pub fn matches(&self, pattern: &str, name: &str) -> bool {
        self.compile(&[pattern]).is_match(name)
    }

    /// Glob text for a normalized pattern. A trailing `**` also matches the
    /// prefix itself, which globset expresses as a second glob.
    fn globs(&self, pattern: &str) -> Vec<String> {
        let segments: Vec<String> = split(pattern, &self.separator)
            .map(|segment| {
                if segment == "**" {
                    segment.to_owned()
                } else {
                    glob_segment(segment)
                }
            })
            .collect();
        let joined = segments.join("/");
        match segments.split_last() {
            Some((last, prefix)) if last == "**" && !prefix.is_empty() => {
                vec![prefix.join("/"), joined]
            }
            _ => vec![joined],
        }
    }
}

/// A compiled pattern list.
#[derive(Debug, Clone)]
pub struct PatternSet {
    set: GlobSet,
    separator: String,
}

impl PatternSet {
    pub fn is_match(&self, name: &str) -> bool {
        let path: Vec<String> = split(name, &self.separator)
            .map(|segment| segment.replace('/', &SLASH_IN_SEGMENT.to_string()))
            .collect();
        self.set.is_match(path.join("/"))
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

fn split<'a>(s: &'a str, separator: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    if separator.is_empty() {
        return Box::new((!s.is_empty()).then_some(s).into_iter());
    }
    Box::new(s.split(separator).filter(|t| !t.is_empty()))
}

/// Escape glob syntax Ant does not know and fold `**` inside a segment to `*`.
fn glob_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut previous_star = false;
    for c in segment.chars() {
        match c {
            '*' if previous_star => continue,
            '*' | '?' => out.push(c),
            '/' => out.push(SLASH_IN_SEGMENT),
            '[' | ']' | '{' | '}' | '\\' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
        previous_star = c == '*';
    }
    out
}
