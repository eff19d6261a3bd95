//! Node and edge predicates used to build filtered views.
//!
//! Any `Fn(&Node) -> bool` / `Fn(&Dependency) -> bool` closure is a filter.
//! The named filters below cover the common property, name and type checks
//! and combine through [`And`], [`Or`] and [`Not`].

use crate::matcher::{NameMatcher, PatternSet};
use crate::model::*;
use crate::storage::DependencyGraph;

pub trait NodeFilter: Send + Sync {
    fn is_accepted(&self, node: &Node) -> bool;
}

pub trait EdgeFilter: Send + Sync {
    fn is_accepted(&self, dep: &Dependency) -> bool;
}

impl<F> NodeFilter for F
where
    F: Fn(&Node) -> bool + Send + Sync,
{
    fn is_accepted(&self, node: &Node) -> bool { self(node) }
}

impl<F> EdgeFilter for F
where
    F: Fn(&Dependency) -> bool + Send + Sync,
{
    fn is_accepted(&self, dep: &Dependency) -> bool { self(dep) }
}

// ============================================================================
// Combinators
// ============================================================================

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrueFilter;

impl NodeFilter for TrueFilter {
    fn is_accepted(&self, _: &Node) -> bool { true }
}

impl EdgeFilter for TrueFilter {
    fn is_accepted(&self, _: &Dependency) -> bool { true }
}

#[derive(Debug, Clone)]
pub struct And<A, B>(pub A, pub B);

#[derive(Debug, Clone)]
pub struct Or<A, B>(pub A, pub B);

#[derive(Debug, Clone)]
pub struct Not<A>(pub A);

impl<A: NodeFilter, B: NodeFilter> NodeFilter for And<A, B> {
    fn is_accepted(&self, node: &Node) -> bool { self.0.is_accepted(node) && self.1.is_accepted(node) }
}

impl<A: EdgeFilter, B: EdgeFilter> EdgeFilter for And<A, B> {
    fn is_accepted(&self, dep: &Dependency) -> bool { self.0.is_accepted(dep) && self.1.is_accepted(dep) }
}

impl<A: NodeFilter, B: NodeFilter> NodeFilter for Or<A, B> {
    fn is_accepted(&self, node: &Node) -> bool { self.0.is_accepted(node) || self.1.is_accepted(node) }
}

impl<A: EdgeFilter, B: EdgeFilter> EdgeFilter for Or<A, B> {
    fn is_accepted(&self, dep: &Dependency) -> bool { self.0.is_accepted(dep) || self.1.is_accepted(dep) }
}

impl<A: NodeFilter> NodeFilter for Not<A> {
    fn is_accepted(&self, node: &Node) -> bool { !self.0.is_accepted(node) }
}

impl<A: EdgeFilter> EdgeFilter for Not<A> {
    fn is_accepted(&self, dep: &Dependency) -> bool { !self.0.is_accepted(dep) }
}

// ============================================================================
// Property filters
// ============================================================================

/// Property `key` equals one of `values`, or is a list containing one.
#[derive(Debug, Clone)]
pub struct NodePropertyIn {
    key: String,
    values: Vec<Value>,
}

impl NodePropertyIn {
    pub fn new<V: Into<Value>>(key: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self { key: key.into(), values: values.into_iter().map(Into::into).collect() }
    }
}

impl NodeFilter for NodePropertyIn {
    fn is_accepted(&self, node: &Node) -> bool {
        node.property(&self.key)
            .is_some_and(|v| self.values.iter().any(|wanted| v.contains(wanted)))
    }
}

#[derive(Debug, Clone)]
pub struct DependencyPropertyIn {
    key: String,
    values: Vec<Value>,
}

impl DependencyPropertyIn {
    pub fn new<V: Into<Value>>(key: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Self { key: key.into(), values: values.into_iter().map(Into::into).collect() }
    }
}

impl EdgeFilter for DependencyPropertyIn {
    fn is_accepted(&self, dep: &Dependency) -> bool {
        dep.property(&self.key)
            .is_some_and(|v| self.values.iter().any(|wanted| v.contains(wanted)))
    }
}

#[derive(Debug, Clone)]
pub struct NodePropertyExists(pub String);

impl NodeFilter for NodePropertyExists {
    fn is_accepted(&self, node: &Node) -> bool { node.has_property(&self.0) }
}

#[derive(Debug, Clone)]
pub struct DependencyPropertyExists(pub String);

impl EdgeFilter for DependencyPropertyExists {
    fn is_accepted(&self, dep: &Dependency) -> bool { dep.has_property(&self.0) }
}

// ============================================================================
// Name filters
// ============================================================================

/// Node name matches one of the patterns.
#[derive(Debug, Clone)]
pub struct NodeNameIn {
    patterns: PatternSet,
}

impl NodeNameIn {
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::with_matcher(NameMatcher::default(), patterns)
    }

    pub fn with_matcher(matcher: NameMatcher, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        Self { patterns: matcher.compile(&patterns) }
    }
}

impl NodeFilter for NodeNameIn {
    fn is_accepted(&self, node: &Node) -> bool {
        self.patterns.is_match(node.name())
    }
}

/// Dependency target name matches one of the patterns.
#[derive(Debug, Clone)]
pub struct DependencyTo(pub NodeNameIn);

impl EdgeFilter for DependencyTo {
    fn is_accepted(&self, dep: &Dependency) -> bool { self.0.is_accepted(dep.target()) }
}

// ============================================================================
// Type filters
// ============================================================================

#[derive(Debug, Clone)]
pub struct DependencyTypeIn(pub Vec<DependencyType>);

impl EdgeFilter for DependencyTypeIn {
    fn is_accepted(&self, dep: &Dependency) -> bool {
        self.0.contains(&dep.dependency_type())
    }
}

/// Node has at least one outgoing edge of one of the types in `graph`.
#[derive(Debug, Clone)]
pub struct NodeHasOutgoingDependencyType {
    pub graph: DependencyGraph,
    pub types: Vec<DependencyType>,
}

impl NodeFilter for NodeHasOutgoingDependencyType {
    fn is_accepted(&self, node: &Node) -> bool {
        self.graph
            .outgoing_edges(node)
            .iter()
            .any(|d| self.types.contains(&d.dependency_type()))
    }
}

/// Node has at least one incoming edge of one of the types in `graph`.
#[derive(Debug, Clone)]
pub struct NodeHasIncomingDependencyType {
    pub graph: DependencyGraph,
    pub types: Vec<DependencyType>,
}

impl NodeFilter for NodeHasIncomingDependencyType {
    fn is_accepted(&self, node: &Node) -> bool {
        self.graph
            .incoming_edges(node)
            .iter()
            .any(|d| self.types.contains(&d.dependency_type()))
    }
}

/// Node has an outgoing edge in `graph` accepted by `edges`.
#[derive(Debug, Clone)]
pub struct NodeHasDependencyTo<E> {
    pub graph: DependencyGraph,
    pub edges: E,
}

impl<E: EdgeFilter> NodeFilter for NodeHasDependencyTo<E> {
    fn is_accepted(&self, node: &Node) -> bool {
        self.graph.outgoing_edges(node).iter().any(|d| self.edges.is_accepted(d))
    }
}
