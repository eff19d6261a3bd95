//! # Dependency Graph
//!
//! `DependencyGraph` is the one handle type for both the mutable root graph
//! and its filtered views. A view is the root's arena plus a snapshot of the
//! masks accumulated by `filter_nodes` / `filter_edges`:
//!
//! ```text
//! root ──filter_nodes(f1)──▶ view(f1) ──filter_edges(f2)──▶ view(f1, f2)
//!   ▲                                                           │
//!   └────────────────────────── base_graph() ───────────────────┘
//! ```
//!
//! A node is visible if every node mask accepts it. An edge is visible if
//! every edge mask accepts it and both endpoints are visible. Views reject
//! structural mutation with [`Error::Unmodifiable`] but share properties with
//! the root, so property writes through a view are seen everywhere.

pub mod memory;
pub mod filter;

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::model::*;
use crate::{Error, Result};

pub use filter::{EdgeFilter, NodeFilter};
use memory::{GraphStore, SharedStore};

#[derive(Clone)]
enum Mask {
    Node(Arc<dyn NodeFilter>),
    Edge(Arc<dyn EdgeFilter>),
}

// ============================================================================
// DependencyGraph
// ============================================================================

/// A dependency graph, or a masked view of one.
#[derive(Clone)]
pub struct DependencyGraph {
    store: SharedStore,
    masks: SmallVec<[Mask; 2]>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    /// Create an empty, mutable root graph.
    pub fn new() -> Self {
        Self { store: GraphStore::shared(), masks: SmallVec::new() }
    }

    /// The mutable root this graph or view was derived from.
    pub fn base_graph(&self) -> DependencyGraph {
        Self { store: Arc::clone(&self.store), masks: SmallVec::new() }
    }

    /// True for a root graph, false for any filtered view.
    pub fn is_base_graph(&self) -> bool {
        self.masks.is_empty()
    }

    /// True if both handles share one arena.
    pub fn same_store(&self, other: &DependencyGraph) -> bool {
        Arc::ptr_eq(&self.store, &other.store)
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// A view hiding every node `filter` rejects, and every edge touching one.
    pub fn filter_nodes(&self, filter: impl NodeFilter + 'static) -> DependencyGraph {
        let mut masks = self.masks.clone();
        masks.push(Mask::Node(Arc::new(filter)));
        Self { store: Arc::clone(&self.store), masks }
    }

    /// A view hiding every edge `filter` rejects. Nodes stay visible.
    pub fn filter_edges(&self, filter: impl EdgeFilter + 'static) -> DependencyGraph {
        let mut masks = self.masks.clone();
        masks.push(Mask::Edge(Arc::new(filter)));
        Self { store: Arc::clone(&self.store), masks }
    }

    pub fn is_node_visible(&self, node: &Node) -> bool {
        self.masks.iter().all(|mask| match mask {
            Mask::Node(filter) => filter.is_accepted(node),
            Mask::Edge(_) => true,
        })
    }

    pub fn is_edge_visible(&self, dep: &Dependency) -> bool {
        self.masks.iter().all(|mask| match mask {
            Mask::Node(_) => true,
            Mask::Edge(filter) => filter.is_accepted(dep),
        }) && self.is_node_visible(dep.source())
            && self.is_node_visible(dep.target())
    }

    fn check_modifiable(&self, operation: &str) -> Result<()> {
        if self.is_base_graph() {
            Ok(())
        } else {
            Err(Error::Unmodifiable(operation.to_owned()))
        }
    }

    /// Arena index of `node` in this graph. Handles from another graph are
    /// resolved by name.
    fn resolve(&self, store: &GraphStore, node: &Node) -> Option<NodeId> {
        if Arc::ptr_eq(node.store(), &self.store) {
            Some(node.id())
        } else {
            store.node_id(node.name())
        }
    }

    // ========================================================================
    // Mutation (root only)
    // ========================================================================

    /// Return the node called `name`, creating it if needed.
    pub fn get_or_create_node_by_name(&self, name: &str) -> Result<Node> {
        self.check_modifiable("get_or_create_node_by_name")?;
        let mut store = self.store.write();
        let id = store.get_or_create_node(name)?;
        Ok(memory::node_handle(&self.store, &store, id))
    }

    /// Record a dependency from `from` to `to`.
    ///
    /// An existing edge for the pair is reused and its type upgraded when
    /// `dep_type` is stronger. There is never more than one edge per pair.
    pub fn add_dependency(&self, from: &Node, to: &Node, dep_type: DependencyType) -> Result<Dependency> {
        self.check_modifiable("add_dependency")?;
        for node in [from, to] {
            if !Arc::ptr_eq(node.store(), &self.store) {
                return Err(Error::InvalidArgument(format!(
                    "node {node} belongs to another graph"
                )));
            }
        }
        let mut store = self.store.write();
        let id = store.add_dependency(from.id(), to.id(), dep_type)?;
        Ok(memory::dependency_handle(&self.store, &store, id))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn node(&self, name: &str) -> Option<Node> {
        let node = {
            let store = self.store.read();
            let id = store.node_id(name)?;
            memory::node_handle(&self.store, &store, id)
        };
        self.is_node_visible(&node).then_some(node)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// The edge from `from` to `to`, if present and visible.
    pub fn edge(&self, from: &Node, to: &Node) -> Option<Dependency> {
        let dep = {
            let store = self.store.read();
            let id = store.edge_id(self.resolve(&store, from)?, self.resolve(&store, to)?)?;
            memory::dependency_handle(&self.store, &store, id)
        };
        self.is_edge_visible(&dep).then_some(dep)
    }

    pub fn all_nodes(&self) -> Vec<Node> {
        let nodes: Vec<Node> = {
            let store = self.store.read();
            store
                .node_ids()
                .map(|id| memory::node_handle(&self.store, &store, id))
                .collect()
        };
        nodes.into_iter().filter(|n| self.is_node_visible(n)).collect()
    }

    pub fn all_edges(&self) -> Vec<Dependency> {
        let edges: Vec<Dependency> = {
            let store = self.store.read();
            store
                .edge_ids()
                .map(|id| memory::dependency_handle(&self.store, &store, id))
                .collect()
        };
        self.visible(edges)
    }

    pub fn node_count(&self) -> usize {
        if self.is_base_graph() {
            self.store.read().node_count()
        } else {
            self.all_nodes().len()
        }
    }

    pub fn edge_count(&self) -> usize {
        if self.is_base_graph() {
            self.store.read().edge_count()
        } else {
            self.all_edges().len()
        }
    }

    pub fn outgoing_edges(&self, node: &Node) -> Vec<Dependency> {
        self.adjacent(node, |record| &record.outgoing)
    }

    pub fn incoming_edges(&self, node: &Node) -> Vec<Dependency> {
        self.adjacent(node, |record| &record.incoming)
    }

    pub fn outgoing_edges_of_type(&self, node: &Node, dep_type: DependencyType) -> Vec<Dependency> {
        self.outgoing_edges(node)
            .into_iter()
            .filter(|d| d.dependency_type() == dep_type)
            .collect()
    }

    pub fn incoming_edges_of_type(&self, node: &Node, dep_type: DependencyType) -> Vec<Dependency> {
        self.incoming_edges(node)
            .into_iter()
            .filter(|d| d.dependency_type() == dep_type)
            .collect()
    }

    fn adjacent(
        &self,
        node: &Node,
        side: impl Fn(&memory::NodeRecord) -> &Vec<DepId>,
    ) -> Vec<Dependency> {
        let edges: Vec<Dependency> = {
            let store = self.store.read();
            let Some(id) = self.resolve(&store, node) else {
                return Vec::new();
            };
            side(store.node(id))
                .iter()
                .map(|&dep| memory::dependency_handle(&self.store, &store, dep))
                .collect()
        };
        self.visible(edges)
    }

    fn visible(&self, edges: Vec<Dependency>) -> Vec<Dependency> {
        if self.is_base_graph() {
            return edges;
        }
        edges.into_iter().filter(|d| self.is_edge_visible(d)).collect()
    }
}

impl fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("base", &self.is_base_graph())
            .field("masks", &self.masks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::filter::NodePropertyIn;

    fn abc() -> (DependencyGraph, Node, Node, Node) {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("a").unwrap();
        let b = g.get_or_create_node_by_name("b").unwrap();
        let c = g.get_or_create_node_by_name("c").unwrap();
        g.add_dependency(&a, &b, DependencyType::ReadOnly).unwrap();
        g.add_dependency(&b, &c, DependencyType::Inherit).unwrap();
        (g, a, b, c)
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("a").unwrap();
        assert_eq!(g.get_or_create_node_by_name("a").unwrap().id(), a.id());
        assert_eq!(g.node_count(), 1);
        assert!(g.has_node("a"));
        assert!(!g.has_node("b"));
    }

    #[test]
    fn test_upgrade_sequence() {
        let (g, a, b, _) = abc();
        g.add_dependency(&a, &b, DependencyType::Create).unwrap();
        let dep = g.add_dependency(&a, &b, DependencyType::ReadWrite).unwrap();
        assert_eq!(dep.dependency_type(), DependencyType::Create);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_view_rejects_mutation() {
        let (g, a, b, _) = abc();
        let view = g.filter_nodes(|_: &Node| true);
        assert!(!view.is_base_graph());
        assert!(matches!(view.get_or_create_node_by_name("x"), Err(Error::Unmodifiable(_))));
        assert!(matches!(
            view.add_dependency(&a, &b, DependencyType::Test),
            Err(Error::Unmodifiable(_))
        ));
        assert!(view.base_graph().is_base_graph());
        assert!(view.base_graph().same_store(&g));
    }

    #[test]
    fn test_node_mask_hides_touching_edges() {
        let (g, a, b, c) = abc();
        let view = g.filter_nodes(move |n: &Node| n.name() != "b");
        assert_eq!(view.node_count(), 2);
        assert_eq!(view.edge_count(), 0);
        assert!(view.edge(&a, &b).is_none());
        assert!(view.outgoing_edges(&a).is_empty());
        assert!(view.incoming_edges(&c).is_empty());
        assert!(view.node("b").is_none());
    }

    #[test]
    fn test_edge_mask_keeps_nodes() {
        let (g, a, _, _) = abc();
        let view = g.filter_edges(|d: &Dependency| d.dependency_type() == DependencyType::Inherit);
        assert_eq!(view.node_count(), 3);
        assert_eq!(view.edge_count(), 1);
        assert!(view.outgoing_edges(&a).is_empty());
    }

    #[test]
    fn test_property_writes_visible_through_views() {
        let (g, a, _, _) = abc();
        let view = g.filter_nodes(NodePropertyIn::new("tag", [true]));
        assert_eq!(view.node_count(), 0);
        a.set_property("tag", true).unwrap();
        assert_eq!(view.all_nodes(), vec![a]);
    }

    #[test]
    fn test_typed_adjacency() {
        let (g, _, b, _) = abc();
        assert_eq!(g.outgoing_edges_of_type(&b, DependencyType::Inherit).len(), 1);
        assert!(g.outgoing_edges_of_type(&b, DependencyType::ReadOnly).is_empty());
        assert_eq!(g.incoming_edges_of_type(&b, DependencyType::ReadOnly).len(), 1);
    }
}
