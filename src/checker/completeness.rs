//! Components that contain nothing.

use tracing::warn;

use super::{format_list, Checker};
use crate::architecture::Architecture;
use crate::model::DependencyType;
use crate::storage::DependencyGraph;

/// Reports every component whose node is visible in the graph but has no
/// outgoing CONTAINS edge in the base graph.
#[derive(Debug, Clone, Default)]
pub struct AllComponentsImplementedChecker {
    messages: Vec<String>,
}

impl AllComponentsImplementedChecker {
    pub fn check(graph: &DependencyGraph, architecture: &Architecture) -> Self {
        let base = graph.base_graph();
        let mut messages = Vec::new();

        for component in architecture.all_components() {
            let Some(node) = graph.node(component.name()) else {
                continue;
            };
            if base.outgoing_edges_of_type(&node, DependencyType::Contains).is_empty() {
                warn!("{}: Component does not have any corresponding classes.", component.name());
                messages.push(component.name().to_owned());
            }
        }
        Self { messages }
    }
}

impl Checker for AllComponentsImplementedChecker {
    fn violation_messages(&self) -> &[String] {
        &self.messages
    }

    fn summary(&self) -> String {
        format!(
            "{} components without corresponding classes: {}",
            self.messages.len(),
            format_list(&self.messages)
        )
    }
}
