//! JSON exchange format: write a graph out, read it back, or merge a file
//! into an existing graph.
//!
//! ```text
//! {
//!   "nodes": [ { "name": "a", "k": "v" }, ... ],            sorted by name
//!   "edges": [ { "from": "a", "to": "b", "type": "READ_ONLY",
//!                "props": { ... },
//!                "baseDependencies": [ { "from", "to", "type" } ] } ]
//! }                                                         sorted by "from#to"
//! ```
//!
//! Property keys are written in sorted order, so writing an unchanged graph
//! twice gives byte-identical output. The reader skips `//` line comments.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::*;
use crate::storage::DependencyGraph;
use crate::{Error, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    nodes: Vec<BTreeMap<String, Value>>,
    #[serde(default)]
    edges: Vec<EdgeDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EdgeDocument {
    from: String,
    to: String,
    #[serde(rename = "type")]
    dep_type: DependencyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    props: Option<BTreeMap<String, Value>>,
    #[serde(default, rename = "baseDependencies", skip_serializing_if = "Option::is_none")]
    base_dependencies: Option<Vec<EdgeDocument>>,
}

fn sort_key(from: &str, to: &str) -> String {
    format!("{from}#{to}")
}

// ============================================================================
// Writing
// ============================================================================

fn to_document(graph: &DependencyGraph) -> GraphDocument {
    let mut sorted = graph.all_nodes();
    sorted.sort();
    let nodes: Vec<BTreeMap<String, Value>> = sorted
        .iter()
        .map(|n| n.properties().into_iter().collect())
        .collect();

    let mut edges: Vec<EdgeDocument> = graph
        .all_edges()
        .iter()
        .map(|dep| {
            let mut base: Vec<EdgeDocument> = dep
                .base_dependencies()
                .iter()
                .filter(|b| graph.is_edge_visible(b))
                .map(|b| EdgeDocument {
                    from: b.source().name().to_owned(),
                    to: b.target().name().to_owned(),
                    dep_type: b.dependency_type(),
                    props: None,
                    base_dependencies: None,
                })
                .collect();
            base.sort_by_key(|e| sort_key(&e.from, &e.to));
            EdgeDocument {
                from: dep.source().name().to_owned(),
                to: dep.target().name().to_owned(),
                dep_type: dep.dependency_type(),
                props: Some(dep.properties().into_iter().collect()),
                base_dependencies: Some(base),
            }
        })
        .collect();
    edges.sort_by_key(|e| sort_key(&e.from, &e.to));

    GraphDocument { nodes, edges }
}

/// Serialize the visible part of `graph` as pretty-printed JSON.
pub fn to_json(graph: &DependencyGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_document(graph))?)
}

pub fn write_to(graph: &DependencyGraph, writer: &mut dyn Write) -> Result<()> {
    writer.write_all(to_json(graph)?.as_bytes())?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_graph(graph: &DependencyGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    info!(
        "Writing graph with {} nodes and {} edges to '{}'",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    let mut file = fs::File::create(path)?;
    write_to(graph, &mut file)
}

// ============================================================================
// Reading
// ============================================================================

/// Parse a graph document into a new graph.
pub fn from_json(text: &str) -> Result<DependencyGraph> {
    let graph = DependencyGraph::new();
    merge_json(&graph, text)?;
    Ok(graph)
}

pub fn read_graph(path: impl AsRef<Path>) -> Result<DependencyGraph> {
    let graph = DependencyGraph::new();
    merge_graph(&graph, path)?;
    Ok(graph)
}

pub fn merge_graph(graph: &DependencyGraph, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    info!("Reading graph from '{}'", path.display());
    let text = fs::read_to_string(path)?;
    merge_json(graph, &text)
}

/// Add the nodes and edges of a graph document to `graph`.
///
/// A property already present with a different value is combined into a
/// list. Edges and base dependencies must point at nodes of the document or
/// of `graph`; a document that does not is rejected before `graph` changes.
pub fn merge_json(graph: &DependencyGraph, text: &str) -> Result<()> {
    let document: GraphDocument = serde_json::from_str(&strip_line_comments(text))?;
    if !graph.is_base_graph() {
        return Err(Error::Unmodifiable("merge_json".to_owned()));
    }
    validate(graph, &document)?;

    for props in &document.nodes {
        let node = graph.get_or_create_node_by_name(node_name(props)?)?;
        for (key, value) in props.iter().filter(|(k, _)| k.as_str() != NAME_KEY) {
            match node.property(key) {
                Some(existing) if existing != *value => node.add_list_property(key, value.clone())?,
                Some(_) => {}
                None => node.set_property(key, value.clone())?,
            }
        }
    }

    for doc in &document.edges {
        let from = lookup_node(graph, &doc.from)?;
        let to = lookup_node(graph, &doc.to)?;
        let dep = graph.add_dependency(&from, &to, doc.dep_type)?;
        for (key, value) in doc.props.iter().flatten() {
            match dep.property(key) {
                Some(existing) if existing != *value => dep.add_list_property(key, value.clone())?,
                Some(_) => {}
                None => dep.set_property(key, value.clone())?,
            }
        }
    }

    for doc in &document.edges {
        let dep = lookup_edge(graph, doc)?;
        link_base_dependencies(graph, &dep, doc)?;
    }

    info!("Graph now has {} nodes and {} edges", graph.node_count(), graph.edge_count());
    Ok(())
}

fn node_name(props: &BTreeMap<String, Value>) -> Result<&str> {
    props
        .get(NAME_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidGraph("node without a string name".to_owned()))
}

/// Every endpoint names a node of the document or of `graph`, and every base
/// dependency names an edge of either.
fn validate(graph: &DependencyGraph, document: &GraphDocument) -> Result<()> {
    let names: HashSet<&str> = document.nodes.iter().map(node_name).collect::<Result<_>>()?;
    let pairs: HashSet<(&str, &str)> = document
        .edges
        .iter()
        .map(|doc| (doc.from.as_str(), doc.to.as_str()))
        .collect();

    let mut stack: Vec<(&EdgeDocument, bool)> = document.edges.iter().map(|doc| (doc, false)).collect();
    while let Some((doc, nested)) = stack.pop() {
        for name in [&doc.from, &doc.to] {
            if !names.contains(name.as_str()) && !graph.has_node(name) {
                return Err(Error::InvalidGraph(format!("edge references unknown node {name}")));
            }
        }
        if nested && !pairs.contains(&(doc.from.as_str(), doc.to.as_str())) && lookup_edge(graph, doc).is_err() {
            return Err(Error::InvalidGraph(format!("unknown base dependency {} -> {}", doc.from, doc.to)));
        }
        stack.extend(doc.base_dependencies.iter().flatten().map(|base| (base, true)));
    }
    Ok(())
}

fn lookup_node(graph: &DependencyGraph, name: &str) -> Result<Node> {
    graph
        .node(name)
        .ok_or_else(|| Error::InvalidGraph(format!("edge references unknown node {name}")))
}

fn lookup_edge(graph: &DependencyGraph, doc: &EdgeDocument) -> Result<Dependency> {
    let from = lookup_node(graph, &doc.from)?;
    let to = lookup_node(graph, &doc.to)?;
    graph
        .edge(&from, &to)
        .ok_or_else(|| Error::InvalidGraph(format!("unknown base dependency {} -> {}", doc.from, doc.to)))
}

fn link_base_dependencies(graph: &DependencyGraph, dep: &Dependency, doc: &EdgeDocument) -> Result<()> {
    for base_doc in doc.base_dependencies.iter().flatten() {
        let base = lookup_edge(graph, base_doc)?;
        dep.add_base_dependency(&base)?;
        link_base_dependencies(graph, &base, base_doc)?;
    }
    Ok(())
}

/// Drop `//` comments that start outside string literals.
fn strip_line_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let mut in_string = false;
        let mut escaped = false;
        let mut cut = line.len();
        let bytes = line.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
            } else if b == b'"' {
                in_string = true;
            } else if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
                cut = i;
                break;
            }
        }
        out.push_str(&line[..cut]);
        out.push('\n');
    }
    out
}
