//! DependencyType: ordered strength classification of a dependency.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Kind of coupling recorded by a dependency.
///
/// Declaration order is the strength order. `add_dependency` only ever moves
/// an edge to a stronger type. `Contains` is reserved for hierarchy edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyType {
    Reference,
    ReadOnly,
    AnnotatedBy,
    Injected,
    ReadWrite,
    Create,
    Inherit,
    Test,
    Provided,
    Runtime,
    Compile,
    Contains,
}

impl DependencyType {
    pub const ALL: [DependencyType; 12] = [
        DependencyType::Reference,
        DependencyType::ReadOnly,
        DependencyType::AnnotatedBy,
        DependencyType::Injected,
        DependencyType::ReadWrite,
        DependencyType::Create,
        DependencyType::Inherit,
        DependencyType::Test,
        DependencyType::Provided,
        DependencyType::Runtime,
        DependencyType::Compile,
        DependencyType::Contains,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::Reference => "REFERENCE",
            DependencyType::ReadOnly => "READ_ONLY",
            DependencyType::AnnotatedBy => "ANNOTATED_BY",
            DependencyType::Injected => "INJECTED",
            DependencyType::ReadWrite => "READ_WRITE",
            DependencyType::Create => "CREATE",
            DependencyType::Inherit => "INHERIT",
            DependencyType::Test => "TEST",
            DependencyType::Provided => "PROVIDED",
            DependencyType::Runtime => "RUNTIME",
            DependencyType::Compile => "COMPILE",
            DependencyType::Contains => "CONTAINS",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DependencyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownDependencyType(s.to_owned()))
    }
}
