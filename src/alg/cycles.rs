//! Cycle detection.
//!
//! A cycle is a strongly connected component with more than one node,
//! computed over the visible part of a graph. Tarjan runs iteratively on
//! dense indices, so deep dependency chains cannot overflow the stack.

use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::{HashMap, HashSet};
use tracing::{error, info};

use crate::checker::format_list;
use crate::model::keys;
use crate::model::{Dependency, Node};
use crate::storage::DependencyGraph;
use crate::Result;

/// Process-wide, so labels from separate runs never collide.
static CYCLE_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone)]
pub struct CycleFinder {
    graph: DependencyGraph,
    cycles: Vec<Vec<Node>>,
}

impl CycleFinder {
    /// Detects cycles right away. Each cycle is sorted by name, and cycles
    /// are ordered by their first node.
    pub fn new(graph: &DependencyGraph) -> Self {
        let mut nodes = graph.all_nodes();
        nodes.sort();
        info!(
            "Cycle detector: Graph with {} nodes and {} edges",
            nodes.len(),
            graph.edge_count()
        );

        let index: HashMap<Node, usize> = nodes.iter().cloned().zip(0..).collect();
        let adjacency: Vec<Vec<usize>> = nodes
            .iter()
            .map(|node| {
                graph
                    .outgoing_edges(node)
                    .iter()
                    .filter_map(|dep| index.get(dep.target()).copied())
                    .collect()
            })
            .collect();

        let mut cycles: Vec<Vec<Node>> = strongly_connected(&adjacency)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut cycle: Vec<Node> = component.into_iter().map(|i| nodes[i].clone()).collect();
                cycle.sort();
                cycle
            })
            .collect();
        cycles.sort_by(|a, b| a[0].cmp(&b[0]));

        let finder = Self { graph: graph.clone(), cycles };
        finder.log_result();
        finder
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    pub fn cycles(&self) -> &[Vec<Node>] {
        &self.cycles
    }

    /// Tags every cycle member with `IN_CYCLE = true` and a `CYCLE` label
    /// unique to its cycle.
    pub fn mark_cycles(&self) -> Result<()> {
        for cycle in &self.cycles {
            let label = format!("Cycle_{}", CYCLE_COUNTER.fetch_add(1, Ordering::Relaxed));
            for node in cycle {
                node.set_property(keys::IN_CYCLE, true)?;
                node.set_property(keys::CYCLE, label.as_str())?;
            }
        }
        Ok(())
    }

    fn log_result(&self) {
        if !self.has_cycles() {
            info!("Cycle detector: Detected no cycles");
            return;
        }
        let total: usize = self.cycles.iter().map(Vec::len).sum();
        error!("Cycle detector: Detected {} cycle(s) with {} nodes", self.cycles.len(), total);
        for cycle in &self.cycles {
            let names: Vec<&str> = cycle.iter().map(Node::name).collect();
            error!("Cycle: {}", format_list(&names));
            let members: HashSet<&Node> = cycle.iter().collect();
            for source in cycle {
                let mut inner: Vec<Dependency> = self
                    .graph
                    .outgoing_edges(source)
                    .into_iter()
                    .filter(|dep| dep.target() != source && members.contains(dep.target()))
                    .collect();
                inner.sort_by(|a, b| a.target().cmp(b.target()));
                for dep in inner {
                    let bases = dep.base_dependencies();
                    info!("  {} -> {} [{}]", source, dep.target(), bases.len());
                    for base in bases {
                        info!("    * {} -> {} [{}]", base.source(), base.target(), base.dependency_type());
                    }
                }
            }
        }
    }
}

/// Tarjan's algorithm over `0..adjacency.len()`, with an explicit call stack.
fn strongly_connected(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut low = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut components = Vec::new();
    let mut counter = 0usize;

    for root in 0..n {
        if index[root].is_some() {
            continue;
        }
        let mut calls: Vec<(usize, usize)> = vec![(root, 0)];
        index[root] = Some(counter);
        low[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(frame) = calls.last_mut() {
            let v = frame.0;
            if let Some(&w) = adjacency[v].get(frame.1) {
                frame.1 += 1;
                match index[w] {
                    None => {
                        index[w] = Some(counter);
                        low[w] = counter;
                        counter += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        calls.push((w, 0));
                    }
                    Some(w_index) if on_stack[w] => low[v] = low[v].min(w_index),
                    Some(_) => {}
                }
                continue;
            }

            calls.pop();
            if Some(low[v]) == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }
            if let Some(&(parent, _)) = calls.last() {
                low[parent] = low[parent].min(low[v]);
            }
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyType, Value};
    use pretty_assertions::assert_eq;

    fn graph_of(edges: &[(&str, &str)]) -> DependencyGraph {
        let g = DependencyGraph::new();
        for (from, to) in edges {
            let a = g.get_or_create_node_by_name(from).unwrap();
            let b = g.get_or_create_node_by_name(to).unwrap();
            g.add_dependency(&a, &b, DependencyType::ReadOnly).unwrap();
        }
        g
    }

    fn names(finder: &CycleFinder) -> Vec<Vec<String>> {
        finder
            .cycles()
            .iter()
            .map(|c| c.iter().map(|n| n.name().to_owned()).collect())
            .collect()
    }

    #[test]
    fn test_single_cycle_excludes_feeder() {
        let g = graph_of(&[("v1", "v2"), ("v2", "v3"), ("v3", "v1"), ("v4", "v1")]);
        let finder = CycleFinder::new(&g);
        assert!(finder.has_cycles());
        assert_eq!(names(&finder), vec![vec!["v1", "v2", "v3"]]);
    }

    #[test]
    fn test_two_disjoint_cycles() {
        let g = graph_of(&[
            ("c", "a"), ("a", "b"), ("b", "c"),
            ("x", "y"), ("y", "z"), ("z", "x"),
            ("b", "x"),
        ]);
        let finder = CycleFinder::new(&g);
        assert_eq!(names(&finder), vec![vec!["a", "b", "c"], vec!["x", "y", "z"]]);
    }

    #[test]
    fn test_acyclic() {
        let g = graph_of(&[("a", "b"), ("b", "c"), ("a", "c")]);
        let finder = CycleFinder::new(&g);
        assert!(!finder.has_cycles());
        assert!(finder.cycles().is_empty());
    }

    #[test]
    fn test_hidden_nodes_break_cycles() {
        let g = graph_of(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let view = g.filter_nodes(|n: &Node| n.name() != "c");
        assert!(!CycleFinder::new(&view).has_cycles());
    }

    #[test]
    fn test_mark_cycles() {
        let g = graph_of(&[("a", "b"), ("b", "a"), ("x", "y"), ("y", "x"), ("q", "a")]);
        let finder = CycleFinder::new(&g);
        finder.mark_cycles().unwrap();

        let a = g.node("a").unwrap();
        let b = g.node("b").unwrap();
        let x = g.node("x").unwrap();
        assert_eq!(a.property(keys::IN_CYCLE), Some(Value::Bool(true)));
        assert_eq!(a.property(keys::CYCLE), b.property(keys::CYCLE));
        assert_ne!(a.property(keys::CYCLE), x.property(keys::CYCLE));
        assert!(a.property_str(keys::CYCLE).unwrap().starts_with("Cycle_"));
        assert!(!g.node("q").unwrap().has_property(keys::IN_CYCLE));
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let g = DependencyGraph::new();
        let mut previous = g.get_or_create_node_by_name("n0").unwrap();
        let first = previous.clone();
        for i in 1..5000 {
            let next = g.get_or_create_node_by_name(&format!("n{i}")).unwrap();
            g.add_dependency(&previous, &next, DependencyType::ReadOnly).unwrap();
            previous = next;
        }
        g.add_dependency(&previous, &first, DependencyType::ReadOnly).unwrap();
        let finder = CycleFinder::new(&g);
        assert_eq!(finder.cycles().len(), 1);
        assert_eq!(finder.cycles()[0].len(), 5000);
    }
}
