//! Declared rules that never justified a dependency.
//!
//! Reads the `used-rules` marks left by [`super::DependencyChecker`], so it
//! has to run after that checker on the same graph.

use tracing::warn;

use super::{format_list, Checker};
use crate::architecture::Architecture;
use crate::model::keys;
use crate::model::Node;
use crate::storage::DependencyGraph;

#[derive(Debug, Clone, Default)]
pub struct AllExplicitRulesUsedChecker {
    messages: Vec<String>,
}

impl AllExplicitRulesUsedChecker {
    pub fn check(graph: &DependencyGraph, architecture: &Architecture) -> Self {
        let base = graph.base_graph();
        let mut messages = Vec::new();

        let components = std::iter::once(architecture.root()).chain(architecture.all_components());
        for component in components {
            let name = component.name();
            match graph.node(name) {
                Some(node) => unused_rules(&node, &mut messages),
                // Filtered away, nothing to check.
                None if base.has_node(name) => {}
                None => {
                    warn!("No node for component {}", name);
                    messages.push(format!("No node for component {name}"));
                }
            }
        }
        Self { messages }
    }
}

fn unused_rules(node: &Node, messages: &mut Vec<String>) {
    let declared = string_list(node, keys::USES_API);
    let used = string_list(node, keys::USED_RULES);
    for rule in declared.iter().filter(|rule| !used.contains(rule)) {
        warn!("Unused rule in {}: {}", node.name(), rule);
        messages.push(format!("{}: {}", node.name(), rule));
    }
}

fn string_list(node: &Node, key: &str) -> Vec<String> {
    node.property(key).map(|v| v.string_items()).unwrap_or_default()
}

impl Checker for AllExplicitRulesUsedChecker {
    fn violation_messages(&self) -> &[String] {
        &self.messages
    }

    fn summary(&self) -> String {
        format!("{} unused rules: {}", self.messages.len(), format_list(&self.messages))
    }
}
