//! Mapping a dependency graph onto an architecture.
//!
//! Three passes, run in this order by [`super::ArchitectureViewCreator`]:
//!
//! 1. [`ComponentNameTagger`] tags each node with its owning component
//! 2. [`ArchitectureNodeCreator`] adds one node per component plus the
//!    CONTAINS hierarchy, down to the tagged nodes
//! 3. [`DependencyMapper`] folds node-level dependencies into
//!    component-level dependencies, except those from a component into one
//!    of its direct children

use tracing::{debug, warn};

use super::{Architecture, ComponentId};
use crate::model::keys::{self, arch_key};
use crate::model::*;
use crate::storage::DependencyGraph;
use crate::{Error, Result};

fn is_architecture_node(node: &Node) -> bool {
    node.property_str(keys::TYPE).as_deref() == Some(keys::TYPE_ARCHITECTURE)
}

// ============================================================================
// ComponentNameTagger
// ============================================================================

/// Tags every node with the component it belongs to.
///
/// Writes `{arch}-parent`, `{arch}-api`, `{arch}-impl` and `{arch}-is-impl`
/// on mapped nodes, `{arch}-ignored` on excluded nodes, and `{arch}-unmapped`
/// plus `architecture-unmapped` on nodes no component claims.
pub struct ComponentNameTagger<'a> {
    architecture: &'a Architecture,
}

impl<'a> ComponentNameTagger<'a> {
    pub fn new(architecture: &'a Architecture) -> Self {
        Self { architecture }
    }

    /// Returns the names of unmapped nodes, sorted.
    pub fn tag(&self, graph: &DependencyGraph) -> Result<Vec<String>> {
        let arch = self.architecture;
        let mut unmapped = Vec::new();

        for node in graph.all_nodes() {
            if is_architecture_node(&node) {
                continue;
            }
            let name = node.name();
            if !arch.is_included(name) {
                node.set_property(&arch_key(arch.name(), keys::IGNORED_SUFFIX), true)?;
                continue;
            }

            let Some(id) = arch.parent_component(name) else {
                warn!("Node {} is not mapped to any component", name);
                node.set_property(&arch_key(arch.name(), keys::UNMAPPED_SUFFIX), true)?;
                node.add_list_property(keys::UNMAPPED, arch.name())?;
                unmapped.push(name.to_owned());
                continue;
            };

            let component = arch.component(id);
            node.set_property(&arch_key(arch.name(), keys::PARENT_SUFFIX), component.name())?;
            if let Some(api) = component.api_name_for(name) {
                node.set_property(&arch_key(arch.name(), keys::PARENT_API_SUFFIX), api)?;
            }
            if let Some(implementation) = component.impl_name_for(name) {
                node.set_property(&arch_key(arch.name(), keys::PARENT_IMPL_SUFFIX), implementation)?;
                node.set_property(&arch_key(arch.name(), keys::IS_IMPL_SUFFIX), true)?;
            }
        }

        unmapped.sort();
        Ok(unmapped)
    }
}

// ============================================================================
// ArchitectureNodeCreator
// ============================================================================

/// Materializes the component tree in the base graph.
pub struct ArchitectureNodeCreator<'a> {
    architecture: &'a Architecture,
}

impl<'a> ArchitectureNodeCreator<'a> {
    pub fn new(architecture: &'a Architecture) -> Self {
        Self { architecture }
    }

    /// Create component nodes and CONTAINS edges parent → child, then
    /// component → node for every tagged node of `graph`.
    pub fn create(&self, graph: &DependencyGraph) -> Result<()> {
        let arch = self.architecture;
        let base = graph.base_graph();
        let order = arch.depth_first();
        let mut created: Vec<Option<Node>> = vec![None; order.len()];

        for id in order {
            let component = arch.component(id);
            let node = base.get_or_create_node_by_name(component.name())?;
            node.set_property(keys::TYPE, keys::TYPE_ARCHITECTURE)?;
            node.set_property(keys::ARCHITECTURE, arch.name())?;
            node.set_property(arch.name(), true)?;
            node.set_property(keys::USES_API, rule_names(component.uses().keys()))?;
            node.set_property(keys::USES_IMPL, rule_names(component.uses_impl().keys()))?;

            if let Some(parent) = component.parent().and_then(|p| created[p.index()].as_ref()) {
                base.add_dependency(parent, &node, DependencyType::Contains)?;
            }
            created[id.index()] = Some(node);
        }

        let parent_key = arch_key(arch.name(), keys::PARENT_SUFFIX);
        for node in graph.all_nodes() {
            let Some(parent_name) = node.property_str(&parent_key) else {
                continue;
            };
            let parent = component_node(arch, &created, &parent_name)?;
            if *parent != node {
                base.add_dependency(parent, &node, DependencyType::Contains)?;
            }
        }

        debug!("Created {} component nodes for {}", created.len(), arch.name());
        Ok(())
    }
}

fn rule_names<'s>(names: impl Iterator<Item = &'s String>) -> Value {
    Value::List(names.map(Value::from).collect())
}

fn component_node<'n>(arch: &Architecture, created: &'n [Option<Node>], name: &str) -> Result<&'n Node> {
    arch.component_id(name)
        .and_then(|id: ComponentId| created[id.index()].as_ref())
        .ok_or_else(|| Error::Inconsistency(format!("no node for component {name}")))
}

// ============================================================================
// DependencyMapper
// ============================================================================

/// Folds node-level dependencies into dependencies between components.
///
/// The aggregated edge keeps the folded edges as base dependencies and
/// collects the API and Impl set names its targets were tagged with.
pub struct DependencyMapper<'a> {
    architecture: &'a Architecture,
}

impl<'a> DependencyMapper<'a> {
    pub fn new(architecture: &'a Architecture) -> Self {
        Self { architecture }
    }

    pub fn map(&self, graph: &DependencyGraph) -> Result<()> {
        let arch = self.architecture.name();
        let base = graph.base_graph();
        let parent_key = arch_key(arch, keys::PARENT_SUFFIX);
        let api_key = arch_key(arch, keys::PARENT_API_SUFFIX);
        let impl_key = arch_key(arch, keys::PARENT_IMPL_SUFFIX);
        let mut mapped = 0usize;

        for dep in graph.all_edges() {
            if dep.dependency_type() == DependencyType::Contains {
                continue;
            }
            let (Some(from_name), Some(to_name)) = (
                dep.source().property_str(&parent_key),
                dep.target().property_str(&parent_key),
            ) else {
                continue;
            };
            if from_name == to_name {
                continue;
            }

            let from = lookup(&base, &from_name)?;
            let to = lookup(&base, &to_name)?;
            // Parent to child stays on the node level; the checker reads it there.
            if base.edge(&from, &to).is_some_and(|e| e.dependency_type() == DependencyType::Contains) {
                debug!("{} is contained by {}, keeping {} unaggregated", to_name, from_name, dep);
                continue;
            }
            let aggregated = base.add_dependency(&from, &to, dep.dependency_type())?;
            aggregated.add_base_dependency(&dep)?;
            if let Some(api) = dep.target().property(&api_key) {
                aggregated.add_list_property(keys::USES_TARGET_API, api)?;
            }
            if let Some(implementation) = dep.target().property(&impl_key) {
                aggregated.add_list_property(keys::USES_TARGET_IMPL, implementation)?;
            }
            mapped += 1;
        }

        debug!("Mapped {} dependencies onto {}", mapped, arch);
        Ok(())
    }
}

fn lookup(graph: &DependencyGraph, name: &str) -> Result<Node> {
    graph
        .node(name)
        .ok_or_else(|| Error::Inconsistency(format!("no node for component {name}")))
}
