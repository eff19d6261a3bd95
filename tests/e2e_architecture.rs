//! End-to-end tests for architecture mapping and the conformance checks.
//!
//! Fixture: three classes in two top-level packages.
//!
//! ```text
//! com.my.a.b.c ──▶ com.my.a.e.f
//!       │
//!       └──(optional)──▶ org.other.g
//! ```

use depgraph::config::AnalysisConfig;
use depgraph::model::keys;
use depgraph::{
    AllComponentsImplementedChecker, AllExplicitRulesUsedChecker, Analyzer, Architecture,
    ArchitectureViewCreator, Checker, ComponentId, CycleFinder, DependencyChecker, DependencyGraph,
    DependencyType, PackageArchitectureFactory, Value,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn fixture(with_foreign_edge: bool) -> DependencyGraph {
    let g = DependencyGraph::new();
    let c = g.get_or_create_node_by_name("com.my.a.b.c").unwrap();
    let f = g.get_or_create_node_by_name("com.my.a.e.f").unwrap();
    let other = g.get_or_create_node_by_name("org.other.g").unwrap();
    g.add_dependency(&c, &f, DependencyType::ReadOnly).unwrap();
    if with_foreign_edge {
        g.add_dependency(&c, &other, DependencyType::ReadOnly).unwrap();
    }
    g
}

fn package_architecture(g: &DependencyGraph) -> Architecture {
    PackageArchitectureFactory::new(g).create_architecture(0).unwrap()
}

// ============================================================================
// 1. Mapping
// ============================================================================

#[test]
fn test_nodes_map_to_most_specific_component() {
    let g = fixture(false);
    let arch = package_architecture(&g);
    assert_eq!(arch.parent_component_name("com.my.a.b.c"), Some("com.my.a.b"));
    assert_eq!(arch.parent_component_name("com.my.a.e.f"), Some("com.my.a.e"));

    ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
    let c = g.node("com.my.a.b.c").unwrap();
    assert_eq!(c.property_str("Package-parent").as_deref(), Some("com.my.a.b"));
    let a = g.node("com.my.a").unwrap();
    assert!(g.edge(&a, &c).is_none());
}

#[test]
fn test_view_aggregates_dependencies() {
    let g = fixture(true);
    let arch = package_architecture(&g);
    let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
    assert!(view.is_ok());

    let b = view.graph().node("com.my.a.b").unwrap();
    let other = view.graph().node("org.other").unwrap();
    let aggregated = view.graph().edge(&b, &other).unwrap();
    assert_eq!(aggregated.base_dependencies().len(), 1);
    assert_eq!(aggregated.property(keys::USES_TARGET_API), Some(Value::from(vec!["org.other"])));
    assert!(view.graph().node("com.my.a.b.c").is_none());
}

// ============================================================================
// 2. Conformance
// ============================================================================

#[test]
fn test_same_scope_needs_no_rules() {
    let g = fixture(false);
    let arch = package_architecture(&g);
    let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
    let checker = DependencyChecker::check(view.graph(), &arch).unwrap();
    assert!(checker.is_ok());
    assert_eq!(checker.violation_message(), None);
}

#[test]
fn test_foreign_reference_is_one_violation() {
    let g = fixture(true);
    let arch = package_architecture(&g);
    let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
    let checker = DependencyChecker::check(view.graph(), &arch).unwrap();
    assert_eq!(
        checker.violation_messages(),
        ["com.my.a.b --[READ_ONLY]--> org.other".to_owned()]
    );
    let base = &checker.violations()[0].base_dependencies()[0];
    assert_eq!(base.source().name(), "com.my.a.b.c");
    assert_eq!(base.target().name(), "org.other.g");
}

#[test]
fn test_rules_cover_and_are_marked() {
    let g = fixture(true);
    let mut arch = package_architecture(&g);
    let b = arch.component_id("com.my.a.b").unwrap();
    let allowed = arch.class_set("org.other", ["org.other.*"]);
    let legacy = arch.class_set("legacy", ["org.legacy.*"]);
    arch.component_mut(b).add_uses(allowed).add_uses(legacy);

    let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
    assert!(DependencyChecker::check(view.graph(), &arch).unwrap().is_ok());
    let node = g.node("com.my.a.b").unwrap();
    assert_eq!(node.property(keys::USED_RULES), Some(Value::from(vec!["org.other"])));

    let rules = AllExplicitRulesUsedChecker::check(view.graph(), &arch);
    assert_eq!(rules.violation_messages(), ["com.my.a.b: legacy".to_owned()]);
}

#[test]
fn test_component_without_classes() {
    let g = fixture(false);
    let mut arch = package_architecture(&g);
    let another = arch.add_component(ComponentId::ROOT, "Another").unwrap();
    let api = arch.class_set("Another", ["org.something.*"]);
    arch.component_mut(another).add_api(api);

    let view = ArchitectureViewCreator::new(&arch).create_view(&g).unwrap();
    let checker = AllComponentsImplementedChecker::check(view.graph(), &arch);
    assert_eq!(checker.violation_messages(), ["Another".to_owned()]);
}

// ============================================================================
// 3. Full pipeline
// ============================================================================

#[test]
fn test_analyzer_reports_in_pipeline_order() {
    let g = fixture(true);
    let mut arch = package_architecture(&g);
    let another = arch.add_component(ComponentId::ROOT, "Another").unwrap();
    let api = arch.class_set("Another", ["org.something.*"]);
    arch.component_mut(another).add_api(api);

    let report = Analyzer::new(&arch).run(&g).unwrap();
    assert!(!report.is_ok());
    assert_eq!(
        report.violation_messages(),
        vec![
            "1 uncovered dependencies: [com.my.a.b --[READ_ONLY]--> org.other]".to_owned(),
            "1 components without corresponding classes: [Another]".to_owned(),
        ]
    );
    assert!(!report.cycles().has_cycles());
}

#[test]
fn test_config_driven_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analysis.toml");
    std::fs::write(
        &path,
        r#"
architecture_name = "Modules"
max_depth = 2
excludes = ["org.**"]
"#,
    )
    .unwrap();
    let config = AnalysisConfig::load(&path).unwrap();

    let g = fixture(true);
    let arch = PackageArchitectureFactory::from_config(&g, &config)
        .create_architecture(config.max_depth)
        .unwrap();
    assert_eq!(arch.name(), "Modules-2");

    let report = Analyzer::from_config(&arch, &config).run(&g).unwrap();
    assert!(report.is_ok());
    assert_eq!(
        g.node("org.other.g").unwrap().property("Modules-2-ignored"),
        Some(Value::Bool(true))
    );
    assert_eq!(
        g.node("com.my.a.b.c").unwrap().property_str("Modules-2-parent").as_deref(),
        Some("com.my")
    );
}

// ============================================================================
// 4. Cycles
// ============================================================================

#[test]
fn test_cycle_scenario() {
    let g = DependencyGraph::new();
    let v: Vec<_> = (1..=4)
        .map(|i| g.get_or_create_node_by_name(&format!("v{i}")).unwrap())
        .collect();
    for (from, to) in [(0, 1), (1, 2), (2, 0), (3, 0)] {
        g.add_dependency(&v[from], &v[to], DependencyType::Reference).unwrap();
    }
    let finder = CycleFinder::new(&g);
    assert_eq!(finder.cycles().len(), 1);
    let names: Vec<&str> = finder.cycles()[0].iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["v1", "v2", "v3"]);
}

#[test]
fn test_package_cycle_detected_through_pipeline() {
    let g = fixture(false);
    let c = g.node("com.my.a.b.c").unwrap();
    let f = g.node("com.my.a.e.f").unwrap();
    g.add_dependency(&f, &c, DependencyType::Inherit).unwrap();

    let arch = package_architecture(&g);
    let report = Analyzer::new(&arch).run(&g).unwrap();
    assert!(report.is_ok());
    let names: Vec<&str> = report.cycles().cycles()[0].iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["com.my.a.b", "com.my.a.e"]);
    assert_eq!(g.node("com.my.a.e").unwrap().property_bool(keys::IN_CYCLE), Some(true));
}
