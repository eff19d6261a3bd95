//! Architecture views: the component-level projection of a mapped graph.

use hashbrown::HashSet;
use tracing::{debug, info};

use super::mapper::{ArchitectureNodeCreator, ComponentNameTagger, DependencyMapper};
use super::Architecture;
use crate::checker::{format_list, Checker};
use crate::model::keys::{self, arch_key};
use crate::storage::filter::{And, NodePropertyIn};
use crate::storage::DependencyGraph;
use crate::Result;

// ============================================================================
// BaseRelationTagger
// ============================================================================

/// Stores how many base dependencies an edge folds, and between how many
/// distinct sources and targets. Edges without base dependencies are left
/// untouched.
pub struct BaseRelationTagger;

impl BaseRelationTagger {
    pub fn tag(graph: &DependencyGraph) -> Result<()> {
        for dep in graph.all_edges() {
            let bases = dep.base_dependencies();
            if bases.is_empty() {
                continue;
            }
            let sources: HashSet<&str> = bases.iter().map(|b| b.source().name()).collect();
            let targets: HashSet<&str> = bases.iter().map(|b| b.target().name()).collect();
            dep.set_property(keys::BASE_REL_COUNT, bases.len())?;
            dep.set_property(keys::BASE_REL_COUNT_SOURCES, sources.len())?;
            dep.set_property(keys::BASE_REL_COUNT_TARGETS, targets.len())?;
        }
        Ok(())
    }
}

// ============================================================================
// ArchitectureHeightTagger
// ============================================================================

/// Stores `{arch}-height` on component nodes: 0 for leaves, otherwise one
/// more than the lowest child.
pub struct ArchitectureHeightTagger<'a> {
    architecture: &'a Architecture,
}

impl<'a> ArchitectureHeightTagger<'a> {
    pub fn new(architecture: &'a Architecture) -> Self {
        Self { architecture }
    }

    pub fn tag(&self, graph: &DependencyGraph) -> Result<()> {
        let arch = self.architecture;
        let key = arch_key(arch.name(), keys::HEIGHT_SUFFIX);
        let order = arch.depth_first();
        let mut heights = vec![0i64; order.len()];

        for &id in order.iter().rev() {
            let component = arch.component(id);
            heights[id.index()] = component
                .children()
                .iter()
                .map(|child| heights[child.index()] + 1)
                .min()
                .unwrap_or(0);
            if let Some(node) = graph.node(component.name()) {
                node.set_property(&key, heights[id.index()])?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// ArchitectureViewCreator
// ============================================================================

/// Maps a graph onto an architecture and returns the component-level view.
///
/// The view shows the component nodes tagged with the view tag (the
/// architecture name unless set otherwise) and the aggregated edges between
/// them. The source graph keeps all node-level facts.
pub struct ArchitectureViewCreator<'a> {
    architecture: &'a Architecture,
    tag: Option<String>,
}

impl<'a> ArchitectureViewCreator<'a> {
    pub fn new(architecture: &'a Architecture) -> Self {
        Self { architecture, tag: None }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn create_view(&self, graph: &DependencyGraph) -> Result<ArchitectureView> {
        let arch = self.architecture;
        let tag = self.tag.clone().unwrap_or_else(|| arch.name().to_owned());

        let unmapped = ComponentNameTagger::new(arch).tag(graph)?;
        ArchitectureNodeCreator::new(arch).create(graph)?;
        DependencyMapper::new(arch).map(graph)?;
        self.tag_used_components(graph, &tag)?;

        let view = graph.base_graph().filter_nodes(And(
            NodePropertyIn::new(tag.as_str(), [true]),
            NodePropertyIn::new(keys::TYPE, [keys::TYPE_ARCHITECTURE]),
        ));
        BaseRelationTagger::tag(&view)?;
        ArchitectureHeightTagger::new(arch).tag(&view)?;

        info!(
            "Architecture view {} has {} nodes and {} edges, {} unmapped",
            arch.name(),
            view.node_count(),
            view.edge_count(),
            unmapped.len()
        );
        Ok(ArchitectureView { graph: view, architecture: arch.name().to_owned(), unmapped })
    }

    /// Tag every mapped node and the component chain above it with `tag`.
    fn tag_used_components(&self, graph: &DependencyGraph, tag: &str) -> Result<()> {
        let arch = self.architecture;
        let base = graph.base_graph();
        let parent_key = arch_key(arch.name(), keys::PARENT_SUFFIX);
        let mut tagged = 0usize;

        for node in graph.all_nodes() {
            let Some(parent) = node.property_str(&parent_key).and_then(|p| arch.component_id(&p)) else {
                continue;
            };
            node.set_property(tag, true)?;
            for id in arch.ancestors(parent) {
                if let Some(component) = base.node(arch.component(id).name()) {
                    component.set_property(tag, true)?;
                    tagged += 1;
                }
            }
        }
        debug!("Tagged {} component nodes and their members with {}", tagged, tag);
        Ok(())
    }
}

/// Component-level view of a mapped graph, plus the names no component
/// claimed.
#[derive(Debug, Clone)]
pub struct ArchitectureView {
    graph: DependencyGraph,
    architecture: String,
    unmapped: Vec<String>,
}

impl ArchitectureView {
    pub fn graph(&self) -> &DependencyGraph { &self.graph }
    pub fn architecture_name(&self) -> &str { &self.architecture }
    pub fn unmapped(&self) -> &[String] { &self.unmapped }
}

impl Checker for ArchitectureView {
    fn violation_messages(&self) -> &[String] {
        &self.unmapped
    }

    fn summary(&self) -> String {
        format!(
            "There are unmapped classes in architecture {}: {}",
            self.architecture,
            format_list(&self.unmapped)
        )
    }
}
