//! Dependency (directed, typed edge) in the dependency graph.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::property_map;
use super::{DependencyType, Node, PropertyMap, Value};
use crate::storage::memory::{self, SharedStore};
use crate::{Error, Result};

/// Index of a dependency in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepId(u32);

impl DepId {
    /// Fails once an arena holds more than `u32::MAX` dependencies.
    pub(crate) fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(DepId)
            .map_err(|_| Error::InvalidArgument(format!("graph can not hold more than {} dependencies", u32::MAX)))
    }
    pub fn index(self) -> usize { self.0 as usize }
}

/// A directed dependency between two nodes.
///
/// Source and target are fixed. The type only changes by being upgraded
/// through `DependencyGraph::add_dependency`. Base dependencies are
/// references to the finer-grained edges that were folded into this one.
#[derive(Clone)]
pub struct Dependency {
    id: DepId,
    source: Node,
    target: Node,
    store: SharedStore,
}

impl Dependency {
    pub(crate) fn from_store(id: DepId, source: Node, target: Node, store: SharedStore) -> Self {
        Self { id, source, target, store }
    }

    pub fn id(&self) -> DepId { self.id }
    pub fn source(&self) -> &Node { &self.source }
    pub fn target(&self) -> &Node { &self.target }

    pub fn dependency_type(&self) -> DependencyType {
        self.store.read().edge(self.id).dep_type
    }

    pub fn property(&self, key: &str) -> Option<Value> {
        self.store.read().edge(self.id).properties.get(key).cloned()
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.store.read().edge(self.id).properties.contains_key(key)
    }

    pub fn properties(&self) -> PropertyMap {
        self.store.read().edge(self.id).properties.clone()
    }

    pub fn set_property(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut store = self.store.write();
        property_map::set_property(&mut store.edge_mut(self.id).properties, key, value.into())
    }

    pub fn add_list_property(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut store = self.store.write();
        property_map::add_list_property(&mut store.edge_mut(self.id).properties, key, value.into())
    }

    /// Direct base dependencies, in the order they were attached.
    pub fn base_dependencies(&self) -> Vec<Dependency> {
        let store = self.store.read();
        store
            .edge(self.id)
            .base
            .iter()
            .map(|&id| memory::dependency_handle(&self.store, &store, id))
            .collect()
    }

    /// Attach `base` as a finer-grained dependency folded into this one.
    /// Both edges must live in the same graph.
    pub fn add_base_dependency(&self, base: &Dependency) -> Result<()> {
        if !Arc::ptr_eq(&self.store, &base.store) {
            return Err(Error::InvalidArgument(format!(
                "base dependency {base} belongs to another graph"
            )));
        }
        self.store.write().add_base_dependency(self.id, base.id)
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.target == other.target
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.target.hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.source, self.dependency_type(), self.target)
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency({self})")
    }
}

#[cfg(test)]
mod tests {
    use crate::{DependencyGraph, DependencyType, Value};

    #[test]
    fn test_display() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("a").unwrap();
        let b = g.get_or_create_node_by_name("b").unwrap();
        let d = g.add_dependency(&a, &b, DependencyType::ReadOnly).unwrap();
        assert_eq!(d.to_string(), "a --[READ_ONLY]--> b");
    }

    #[test]
    fn test_base_dependencies_are_shared_references() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("a").unwrap();
        let b = g.get_or_create_node_by_name("b").unwrap();
        let c = g.get_or_create_node_by_name("c").unwrap();
        let top = g.add_dependency(&a, &c, DependencyType::Reference).unwrap();
        let base = g.add_dependency(&b, &c, DependencyType::Create).unwrap();
        top.add_base_dependency(&base).unwrap();

        base.set_property("seen", true).unwrap();
        let linked = top.base_dependencies();
        assert_eq!(linked, vec![base.clone()]);
        assert_eq!(linked[0].property("seen"), Some(Value::Bool(true)));
        assert!(top.add_base_dependency(&top).is_err());
    }

    #[test]
    fn test_base_dependency_from_other_graph_is_rejected() {
        let g1 = DependencyGraph::new();
        let g2 = DependencyGraph::new();
        let mk = |g: &DependencyGraph| {
            let a = g.get_or_create_node_by_name("a").unwrap();
            let b = g.get_or_create_node_by_name("b").unwrap();
            g.add_dependency(&a, &b, DependencyType::Reference).unwrap()
        };
        let d1 = mk(&g1);
        let d2 = mk(&g2);
        assert!(d1.add_base_dependency(&d2).is_err());
    }
}
