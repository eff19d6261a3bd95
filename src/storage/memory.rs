//! In-memory arena holding every node and dependency of a graph.
//!
//! All views over one graph share a single `GraphStore` behind
//! `Arc<RwLock<..>>`. Nodes and edges live in insertion-ordered vectors and
//! are addressed by index; names and (source, target) pairs index into them.
//!
//! ## Limitations
//!
//! - **Append-only**: there is no removal. Reduction happens through views.
//! - **Single writer**: each operation takes the lock on its own, so
//!   multi-step mutations are not atomic. Build the graph from one thread,
//!   then analyze.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::debug;

use crate::model::*;
use crate::{Error, Result};

pub(crate) type SharedStore = Arc<RwLock<GraphStore>>;

// ============================================================================
// Records
// ============================================================================

#[derive(Debug)]
pub(crate) struct NodeRecord {
    pub name: Arc<str>,
    pub properties: PropertyMap,
    pub outgoing: Vec<DepId>,
    pub incoming: Vec<DepId>,
}

#[derive(Debug)]
pub(crate) struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub dep_type: DependencyType,
    pub properties: PropertyMap,
    pub base: SmallVec<[DepId; 4]>,
}

// ============================================================================
// GraphStore
// ============================================================================

#[derive(Debug, Default)]
pub(crate) struct GraphStore {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    /// name → node index
    node_index: HashMap<Arc<str>, NodeId>,
    /// (source, target) → edge index
    edge_index: HashMap<(NodeId, NodeId), DepId>,
}

impl GraphStore {
    pub fn shared() -> SharedStore {
        Arc::new(RwLock::new(GraphStore::default()))
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }

    pub fn node(&self, id: NodeId) -> &NodeRecord { &self.nodes[id.index()] }
    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeRecord { &mut self.nodes[id.index()] }
    pub fn edge(&self, id: DepId) -> &EdgeRecord { &self.edges[id.index()] }
    pub fn edge_mut(&mut self, id: DepId) -> &mut EdgeRecord { &mut self.edges[id.index()] }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_index.get(name).copied()
    }

    pub fn edge_id(&self, source: NodeId, target: NodeId) -> Option<DepId> {
        self.edge_index.get(&(source, target)).copied()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map_while(|i| NodeId::from_index(i).ok())
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = DepId> + '_ {
        (0..self.edges.len()).map_while(|i| DepId::from_index(i).ok())
    }

    pub fn get_or_create_node(&mut self, name: &str) -> Result<NodeId> {
        if let Some(id) = self.node_id(name) {
            return Ok(id);
        }
        let id = NodeId::from_index(self.nodes.len())?;
        let name: Arc<str> = Arc::from(name);
        self.nodes.push(NodeRecord {
            name: Arc::clone(&name),
            properties: PropertyMap::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        });
        self.node_index.insert(name, id);
        Ok(id)
    }

    /// Create the (source, target) edge, or upgrade the existing one if
    /// `dep_type` is stronger. Never downgrades.
    pub fn add_dependency(&mut self, source: NodeId, target: NodeId, dep_type: DependencyType) -> Result<DepId> {
        if let Some(id) = self.edge_id(source, target) {
            let current = self.edges[id.index()].dep_type;
            if dep_type > current {
                debug!("Upgrading dependency {} to [{}]", self.describe_edge(id), dep_type);
                self.edges[id.index()].dep_type = dep_type;
            } else {
                debug!("Reusing dependency {}", self.describe_edge(id));
            }
            return Ok(id);
        }

        let id = DepId::from_index(self.edges.len())?;
        self.edges.push(EdgeRecord {
            source,
            target,
            dep_type,
            properties: PropertyMap::new(),
            base: SmallVec::new(),
        });
        self.edge_index.insert((source, target), id);
        self.nodes[source.index()].outgoing.push(id);
        self.nodes[target.index()].incoming.push(id);
        Ok(id)
    }

    /// Link `base` under `edge`. Rejects links that would make the
    /// base-dependency relation cyclic.
    pub fn add_base_dependency(&mut self, edge: DepId, base: DepId) -> Result<()> {
        if edge == base || self.base_reaches(base, edge) {
            return Err(Error::InvalidArgument(format!(
                "{} can not be a base dependency of {}",
                self.describe_edge(base),
                self.describe_edge(edge)
            )));
        }
        let links = &mut self.edges[edge.index()].base;
        if !links.contains(&base) {
            links.push(base);
        }
        Ok(())
    }

    fn base_reaches(&self, from: DepId, needle: DepId) -> bool {
        let mut seen = vec![false; self.edges.len()];
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == needle {
                return true;
            }
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            stack.extend(self.edges[id.index()].base.iter().copied());
        }
        false
    }

    pub fn describe_edge(&self, id: DepId) -> String {
        let edge = &self.edges[id.index()];
        format!(
            "{} --[{}]--> {}",
            self.nodes[edge.source.index()].name,
            edge.dep_type,
            self.nodes[edge.target.index()].name
        )
    }
}

// ============================================================================
// Handle construction
// ============================================================================

pub(crate) fn node_handle(shared: &SharedStore, store: &GraphStore, id: NodeId) -> Node {
    Node::from_store(id, Arc::clone(&store.node(id).name), Arc::clone(shared))
}

pub(crate) fn dependency_handle(shared: &SharedStore, store: &GraphStore, id: DepId) -> Dependency {
    let edge = store.edge(id);
    Dependency::from_store(
        id,
        node_handle(shared, store, edge.source),
        node_handle(shared, store, edge.target),
        Arc::clone(shared),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_names_are_unique() {
        let mut store = GraphStore::default();
        let a = store.get_or_create_node("a").unwrap();
        assert_eq!(store.get_or_create_node("a").unwrap(), a);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_upgrade_never_downgrades() {
        let mut store = GraphStore::default();
        let a = store.get_or_create_node("a").unwrap();
        let b = store.get_or_create_node("b").unwrap();
        let e = store.add_dependency(a, b, DependencyType::Create).unwrap();
        assert_eq!(store.add_dependency(a, b, DependencyType::ReadOnly).unwrap(), e);
        assert_eq!(store.edge(e).dep_type, DependencyType::Create);
        assert_eq!(store.node(a).outgoing, vec![e]);
        assert_eq!(store.node(b).incoming, vec![e]);
    }

    #[test]
    fn test_base_dependency_rejects_cycles() {
        let mut store = GraphStore::default();
        let a = store.get_or_create_node("a").unwrap();
        let b = store.get_or_create_node("b").unwrap();
        let c = store.get_or_create_node("c").unwrap();
        let ab = store.add_dependency(a, b, DependencyType::Reference).unwrap();
        let bc = store.add_dependency(b, c, DependencyType::Reference).unwrap();
        store.add_base_dependency(ab, bc).unwrap();
        store.add_base_dependency(ab, bc).unwrap();
        assert_eq!(store.edge(ab).base.len(), 1);
        assert!(store.add_base_dependency(bc, ab).is_err());
        assert!(store.add_base_dependency(ab, ab).is_err());
    }

    #[test]
    fn test_ids_beyond_u32_are_rejected() {
        assert_eq!(NodeId::from_index(7).unwrap().index(), 7);
        assert_eq!(DepId::from_index(u32::MAX as usize).unwrap().index(), u32::MAX as usize);
        if let Some(past) = (u32::MAX as usize).checked_add(1) {
            assert!(matches!(NodeId::from_index(past), Err(Error::InvalidArgument(_))));
            assert!(matches!(DepId::from_index(past), Err(Error::InvalidArgument(_))));
        }
    }
}
