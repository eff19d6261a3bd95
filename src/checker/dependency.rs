//! Checks every component-level dependency against the usage rules.
//!
//! For an aggregated edge `Cs → Ct`:
//!
//! 1. **Same scope**: if the component owning `Ct` (or `Ct` itself at the
//!    top level) is `Cs` or one of its ancestors, API references need no
//!    rule.
//! 2. **API**: otherwise every API name on the edge must be covered by a
//!    `uses` rule of `Cs` or an ancestor. The covering rule is recorded in
//!    that ancestor's `used-rules`.
//! 3. **Impl**: every Impl name on the edge must be covered by a `uses_impl`
//!    rule of `Cs` or an ancestor. Same scope does not waive this.
//!
//! References from a component into one of its direct children share the
//! CONTAINS edge between the two and are never aggregated. Their Impl names
//! are checked per node-level edge, and an uncovered one is reported as is.

use std::collections::BTreeMap;

use tracing::{debug, error, warn};

use super::{format_list, Checker};
use crate::architecture::{Architecture, ClassSet, Component};
use crate::model::keys::{self, arch_key};
use crate::model::*;
use crate::storage::DependencyGraph;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct DependencyChecker {
    violations: Vec<Dependency>,
    messages: Vec<String>,
}

impl DependencyChecker {
    pub fn check(graph: &DependencyGraph, architecture: &Architecture) -> Result<Self> {
        let mut violations = Vec::new();

        for dep in graph.all_edges() {
            if dep.dependency_type() == DependencyType::Contains {
                for coupling in uncovered_child_impl(graph, architecture, &dep) {
                    log_violation(&coupling);
                    violations.push(coupling);
                }
                continue;
            }
            if !is_covered(graph, architecture, &dep)? {
                log_violation(&dep);
                violations.push(dep);
            }
        }

        let messages = violations.iter().map(ToString::to_string).collect();
        Ok(Self { violations, messages })
    }

    /// The uncovered edges, with their base dependencies reachable through
    /// [`Dependency::base_dependencies`].
    pub fn violations(&self) -> &[Dependency] {
        &self.violations
    }
}

impl Checker for DependencyChecker {
    fn violation_messages(&self) -> &[String] {
        &self.messages
    }

    fn summary(&self) -> String {
        format!("{} uncovered dependencies: {}", self.messages.len(), format_list(&self.messages))
    }
}

fn is_covered(graph: &DependencyGraph, architecture: &Architecture, dep: &Dependency) -> Result<bool> {
    let source = dep.source();
    let target = dep.target();
    let chain = ancestors(graph, source);

    let scope_name = architecture
        .parent_component_name(target.name())
        .unwrap_or(target.name())
        .to_owned();
    let scope = graph
        .node(&scope_name)
        .or_else(|| graph.base_graph().node(&scope_name))
        .ok_or_else(|| {
            Error::Inconsistency(format!(
                "Scope {scope_name} has no corresponding node in the dependency graph."
            ))
        })?;
    let same_scope = chain.contains(&scope);

    let api_ok = if same_scope {
        debug!("{} stays within scope {}", dep, scope_name);
        true
    } else {
        let mut ok = true;
        for name in names(dep, keys::USES_TARGET_API) {
            match find_rule(architecture, &chain, &name, Component::uses) {
                Some((owner, rule)) => owner.add_list_property(keys::USED_RULES, rule)?,
                None => ok = false,
            }
        }
        ok
    };

    let impl_ok = names(dep, keys::USES_TARGET_IMPL)
        .iter()
        .all(|name| find_rule(architecture, &chain, name, Component::uses_impl).is_some());

    Ok(api_ok && impl_ok)
}

/// Node-level edges from the classes of a parent component into the Impl of
/// the child `contains` points at, without a `uses_impl` rule on the parent
/// or its ancestors.
fn uncovered_child_impl(graph: &DependencyGraph, architecture: &Architecture, contains: &Dependency) -> Vec<Dependency> {
    let (parent, child) = (contains.source(), contains.target());
    if architecture.component_by_name(parent.name()).is_none()
        || architecture.component_by_name(child.name()).is_none()
    {
        return Vec::new();
    }
    let base = graph.base_graph();
    let parent_key = arch_key(architecture.name(), keys::PARENT_SUFFIX);
    let impl_key = arch_key(architecture.name(), keys::PARENT_IMPL_SUFFIX);
    let chain = ancestors(graph, parent);

    let mut uncovered = Vec::new();
    for member in base.outgoing_edges_of_type(parent, DependencyType::Contains) {
        let class = member.target();
        if class.property_str(&parent_key).as_deref() != Some(parent.name()) {
            continue;
        }
        for dep in base.outgoing_edges(class) {
            let target = dep.target();
            if dep.dependency_type() == DependencyType::Contains
                || target.property_str(&parent_key).as_deref() != Some(child.name())
            {
                continue;
            }
            let impl_names = target.property(&impl_key).map(|v| v.string_items()).unwrap_or_default();
            if !impl_names.iter().all(|name| find_rule(architecture, &chain, name, Component::uses_impl).is_some()) {
                uncovered.push(dep);
            }
        }
    }
    uncovered
}

fn names(dep: &Dependency, key: &str) -> Vec<String> {
    dep.property(key).map(|v| v.string_items()).unwrap_or_default()
}

/// `node` followed by its containers, following incoming CONTAINS edges.
fn ancestors(graph: &DependencyGraph, node: &Node) -> Vec<Node> {
    let mut chain = vec![node.clone()];
    let mut current = node.clone();
    loop {
        let mut parents = graph.incoming_edges_of_type(&current, DependencyType::Contains);
        if parents.is_empty() {
            break;
        }
        if parents.len() > 1 {
            parents.sort_by(|a, b| a.source().cmp(b.source()));
            warn!("{} has {} parents, following {}", current, parents.len(), parents[0].source());
        }
        let parent = parents[0].source().clone();
        if chain.contains(&parent) {
            warn!("Containment cycle at {}", parent);
            break;
        }
        chain.push(parent.clone());
        current = parent;
    }
    chain
}

/// First ancestor with a rule covering `name`, and that rule's name.
fn find_rule(
    architecture: &Architecture,
    chain: &[Node],
    name: &str,
    rules: fn(&Component) -> &BTreeMap<String, ClassSet>,
) -> Option<(Node, String)> {
    chain.iter().find_map(|ancestor| {
        let component = architecture.component_by_name(ancestor.name())?;
        rules(component)
            .iter()
            .find(|(rule, set)| rule.as_str() == name || set.contains(name))
            .map(|(rule, _)| (ancestor.clone(), rule.clone()))
    })
}

fn log_violation(dep: &Dependency) {
    error!("Uncovered dependency: {}", dep);
    let mut stack: Vec<(Dependency, usize)> = dep.base_dependencies().into_iter().map(|b| (b, 1)).collect();
    stack.reverse();
    while let Some((base, depth)) = stack.pop() {
        error!("{:indent$}{}", "", base, indent = depth * 4);
        let children = base.base_dependencies();
        stack.extend(children.into_iter().rev().map(|b| (b, depth + 1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::{ArchitectureViewCreator, ComponentId};
    use pretty_assertions::assert_eq;

    /// front/web uses back/api through a rule, and back/db without one.
    fn layered() -> (DependencyGraph, Architecture) {
        let g = DependencyGraph::new();
        let controller = g.get_or_create_node_by_name("app.front.web.Controller").unwrap();
        let service = g.get_or_create_node_by_name("app.back.api.Service").unwrap();
        let repo = g.get_or_create_node_by_name("app.back.db.Repository").unwrap();
        g.add_dependency(&controller, &service, DependencyType::ReadOnly).unwrap();
        g.add_dependency(&controller, &repo, DependencyType::Create).unwrap();

        let mut arch = Architecture::new("Layers");
        let front = arch.add_component(ComponentId::ROOT, "front").unwrap();
        let back = arch.add_component(ComponentId::ROOT, "back").unwrap();
        for (parent, name) in [(front, "web"), (back, "api"), (back, "db")] {
            let id = arch.add_component(parent, name).unwrap();
            let prefix = arch.component(parent).name().to_owned();
            let api = arch.class_set(name, [format!("app.{prefix}.{name}.*")]);
            arch.component_mut(id).add_api(api);
        }
        let web = arch.component_id("web").unwrap();
        let rule = arch.class_set("api", ["app.back.api.*"]);
        arch.component_mut(web).add_uses(rule);
        (g, arch)
    }

    #[test]
    fn test_unjustified_reference_is_reported_once() {
        let (g, arch) = layered();
        let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
        let checker = DependencyChecker::check(view.graph(), &arch).unwrap();
        assert_eq!(checker.violation_messages(), ["web --[CREATE]--> db".to_owned()]);
        assert_eq!(
            checker.violation_message().as_deref(),
            Some("1 uncovered dependencies: [web --[CREATE]--> db]")
        );
        assert_eq!(checker.violations()[0].base_dependencies().len(), 1);
    }

    #[test]
    fn test_used_rule_is_marked() {
        let (g, arch) = layered();
        let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
        DependencyChecker::check(view.graph(), &arch).unwrap();
        let web = g.node("web").unwrap();
        assert_eq!(web.property(keys::USED_RULES), Some(Value::from(vec!["api"])));
    }

    #[test]
    fn test_siblings_share_scope() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("app.back.api.Service").unwrap();
        let b = g.get_or_create_node_by_name("app.back.db.Repository").unwrap();
        g.add_dependency(&a, &b, DependencyType::ReadWrite).unwrap();
        let (_, arch) = layered();
        let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
        assert!(DependencyChecker::check(view.graph(), &arch).unwrap().is_ok());
    }

    #[test]
    fn test_rule_on_ancestor_covers_descendants() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("app.web.ui.Page").unwrap();
        let b = g.get_or_create_node_by_name("lib.Util").unwrap();
        g.add_dependency(&a, &b, DependencyType::ReadOnly).unwrap();

        let mut arch = Architecture::new("Tiers");
        let web = arch.add_component(ComponentId::ROOT, "web").unwrap();
        let api = arch.class_set("web", ["app.web.*"]);
        arch.component_mut(web).add_api(api);
        let ui = arch.add_component(web, "web.ui").unwrap();
        let api = arch.class_set("web.ui", ["app.web.ui.*"]);
        arch.component_mut(ui).add_api(api);
        let shared = arch.add_component(ComponentId::ROOT, "shared").unwrap();
        let lib = arch.add_component(shared, "shared.lib").unwrap();
        let api = arch.class_set("shared.lib", ["lib.*"]);
        arch.component_mut(lib).add_api(api);
        let rule = arch.class_set("libs", ["shared.lib"]);
        arch.component_mut(web).add_uses(rule);

        let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
        let checker = DependencyChecker::check(view.graph(), &arch).unwrap();
        assert!(checker.is_ok());
        assert_eq!(g.node("web").unwrap().property(keys::USED_RULES), Some(Value::from(vec!["libs"])));
        assert!(!g.node("web.ui").unwrap().has_property(keys::USED_RULES));
    }

    #[test]
    fn test_impl_needs_rule_even_in_scope() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("app.core.a.A").unwrap();
        let b = g.get_or_create_node_by_name("app.core.b.impl.B").unwrap();
        g.add_dependency(&a, &b, DependencyType::ReadOnly).unwrap();

        let mut arch = Architecture::new("Core");
        let core = arch.add_component(ComponentId::ROOT, "core").unwrap();
        for name in ["core.a", "core.b"] {
            let id = arch.add_component(core, name).unwrap();
            let api = arch.class_set(name, [format!("app.{name}.*")]);
            arch.component_mut(id).add_api(api);
        }
        let b_id = arch.component_id("core.b").unwrap();
        let b_impl = arch.class_set("b-impl", ["app.core.b.impl.*"]);
        arch.component_mut(b_id).add_impl(b_impl);

        let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
        let checker = DependencyChecker::check(view.graph(), &arch).unwrap();
        assert_eq!(checker.violation_messages(), ["core.a --[READ_ONLY]--> core.b".to_owned()]);

        let a_id = arch.component_id("core.a").unwrap();
        let allowed = arch.class_set("b-impl", ["app.core.b.impl.*"]);
        arch.component_mut(a_id).add_uses_impl(allowed);
        let checker = DependencyChecker::check(view.graph(), &arch).unwrap();
        assert!(checker.is_ok());
    }

    #[test]
    fn test_parent_reaching_into_child_impl() {
        let g = DependencyGraph::new();
        let main = g.get_or_create_node_by_name("app.core.Main").unwrap();
        let b = g.get_or_create_node_by_name("app.core.b.impl.B").unwrap();
        g.add_dependency(&main, &b, DependencyType::ReadOnly).unwrap();

        let mut arch = Architecture::new("Core");
        let core = arch.add_component(ComponentId::ROOT, "core").unwrap();
        let api = arch.class_set("core", ["app.core.*"]);
        arch.component_mut(core).add_api(api);
        let child = arch.add_component(core, "core.b").unwrap();
        let api = arch.class_set("core.b", ["app.core.b.*"]);
        let implementation = arch.class_set("core.b-impl", ["app.core.b.impl.*"]);
        arch.component_mut(child).add_api(api).add_impl(implementation);

        let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
        let contains = g.edge(&g.node("core").unwrap(), &g.node("core.b").unwrap()).unwrap();
        assert_eq!(contains.dependency_type(), DependencyType::Contains);
        assert!(contains.base_dependencies().is_empty());
        assert!(!contains.has_property(keys::USES_TARGET_IMPL));

        let checker = DependencyChecker::check(view.graph(), &arch).unwrap();
        assert_eq!(
            checker.violation_messages(),
            ["app.core.Main --[READ_ONLY]--> app.core.b.impl.B".to_owned()]
        );

        let allowed = arch.class_set("core.b-impl", ["app.core.b.impl.*"]);
        arch.component_mut(core).add_uses_impl(allowed);
        assert!(DependencyChecker::check(view.graph(), &arch).unwrap().is_ok());
    }

    #[test]
    fn test_missing_scope_node_is_an_error() {
        let g = DependencyGraph::new();
        let a = g.get_or_create_node_by_name("x").unwrap();
        let b = g.get_or_create_node_by_name("y").unwrap();
        g.add_dependency(&a, &b, DependencyType::ReadOnly).unwrap();

        let mut arch = Architecture::new("Arch");
        let id = arch.add_component(ComponentId::ROOT, "owner").unwrap();
        let api = arch.class_set("owner", ["y"]);
        arch.component_mut(id).add_api(api);
        assert!(matches!(DependencyChecker::check(&g, &arch), Err(Error::Inconsistency(_))));
    }
}
