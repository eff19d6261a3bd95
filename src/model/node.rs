//! Node in the dependency graph.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::property_map::{self, NAME_KEY};
use super::{PropertyMap, Value};
use crate::storage::memory::SharedStore;
use crate::{Error, Result};

/// Index of a node in its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Fails once an arena holds more than `u32::MAX` nodes.
    pub(crate) fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(NodeId)
            .map_err(|_| Error::InvalidArgument(format!("graph can not hold more than {} nodes", u32::MAX)))
    }
    pub fn index(self) -> usize { self.0 as usize }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the dependency graph.
///
/// A cheap handle onto the graph arena: cloning it does not copy properties,
/// and property writes through any handle are visible through every view of
/// the graph. Two nodes are equal iff their names are equal.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    name: Arc<str>,
    store: SharedStore,
}

impl Node {
    pub(crate) fn from_store(id: NodeId, name: Arc<str>, store: SharedStore) -> Self {
        Self { id, name, store }
    }

    pub(crate) fn store(&self) -> &SharedStore { &self.store }

    pub fn id(&self) -> NodeId { self.id }

    pub fn name(&self) -> &str { &self.name }

    pub fn property(&self, key: &str) -> Option<Value> {
        if key == NAME_KEY {
            return Some(Value::from(self.name()));
        }
        self.store.read().node(self.id).properties.get(key).cloned()
    }

    pub fn has_property(&self, key: &str) -> bool {
        key == NAME_KEY || self.store.read().node(self.id).properties.contains_key(key)
    }

    /// String value of `key`, if it holds a string.
    pub fn property_str(&self, key: &str) -> Option<String> {
        self.property(key).and_then(|v| v.as_str().map(str::to_owned))
    }

    pub fn property_bool(&self, key: &str) -> Option<bool> {
        self.property(key).and_then(|v| v.as_bool())
    }

    /// Copy of all properties, including the name.
    pub fn properties(&self) -> PropertyMap {
        let mut props = self.store.read().node(self.id).properties.clone();
        props.insert(NAME_KEY.to_owned(), Value::from(self.name()));
        props
    }

    /// Set `key` to `value`; `Value::Null` removes it. The name is immutable.
    pub fn set_property(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut store = self.store.write();
        property_map::set_property(&mut store.node_mut(self.id).properties, key, value.into())
    }

    /// Append to a list property, promoting a scalar and skipping duplicates.
    pub fn add_list_property(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        let mut store = self.store.write();
        property_map::add_list_property(&mut store.node_mut(self.id).properties, key, value.into())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool { self.name == other.name }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) { self.name.hash(state) }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering { self.name.cmp(&other.name) }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use crate::{DependencyGraph, Error, Value};

    #[test]
    fn test_equality_is_by_name() {
        let g1 = DependencyGraph::new();
        let g2 = DependencyGraph::new();
        let a1 = g1.get_or_create_node_by_name("a").unwrap();
        let a2 = g2.get_or_create_node_by_name("a").unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, g1.get_or_create_node_by_name("b").unwrap());
    }

    #[test]
    fn test_name_property() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("a").unwrap();
        assert_eq!(a.property("name"), Some(Value::from("a")));
        assert!(matches!(a.set_property("name", "b"), Err(Error::ImmutableName)));
        assert_eq!(a.properties().len(), 1);
    }

    #[test]
    fn test_writes_are_shared_between_handles() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("a").unwrap();
        a.set_property("k", 1).unwrap();
        let again = g.node("a").unwrap();
        assert_eq!(again.property("k"), Some(Value::Int(1)));
        again.set_property("k", Value::Null).unwrap();
        assert!(!a.has_property("k"));
    }
}
